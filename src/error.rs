//! Error types for the validator
//!
//! `SchemaError` covers fatal failures only: a malformed schema, a failing
//! error hook, a `$ref` cycle, or runaway nesting. Data that does not conform
//! is never an `Err`; it is reported as a list of
//! [`ValidationError`](crate::report::ValidationError)s.

use thiserror::Error;

/// Result type for validator operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Fatal validator errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: String, reason: String },

    #[error("Invalid regular expression at '{path}': {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: regex::Error,
    },

    #[error("Reference cycle detected: '{name}' re-entered at '{path}'")]
    RefCycle { name: String, path: String },

    #[error("Maximum validation depth {limit} exceeded at '{path}'")]
    DepthExceeded { limit: usize, path: String },

    #[error("Error hook failed: {0}")]
    Hook(#[source] anyhow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl SchemaError {
    /// Shorthand for an [`SchemaError::InvalidSchema`] at `path`
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
