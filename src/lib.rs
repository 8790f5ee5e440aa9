//! Familiar Validator
//!
//! A JSON-Schema-style validation engine for the Familiar platform. Given a
//! schema and a JSON value it reports every violation in one pass, each with
//! a path into the value.
//!
//! ## Features
//!
//! - **Single dialect**: `type` (single or union), number/string/array/object
//!   constraints, `enum`, `allOf`, `anyOf`, `oneOf` and `$ref`
//! - **Complete reports**: errors are collected, never short-circuited,
//!   except where a type mismatch makes further checks meaningless
//! - **Shareable schemas**: a parsed [`Schema`] is never mutated and can be
//!   used from many threads at once
//! - **Bounded recursion**: `$ref` cycles and runaway nesting are fatal
//!   errors rather than stack overflows
//! - **Pluggable formats**: `format` checks go through a [`FormatRegistry`]
//!
//! ## Example
//!
//! ```
//! use familiar_validator::{validate_json, ValidationOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "properties": {"a": {"type": "string"}},
//!     "additionalProperties": false
//! });
//! let report = validate_json(&schema, &json!({"a": "ok", "b": 1}), &ValidationOptions::default())?;
//! assert!(!report.valid);
//! assert_eq!(report.errors[0].path, ".b");
//! # Ok::<(), familiar_validator::SchemaError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod instance;
pub mod options;
pub mod report;
pub mod schema;
pub mod validator;

pub use config::ValidatorConfig;
pub use error::{Result, SchemaError};
pub use format::{has_format, matches_format, FormatRegistry};
pub use options::{ErrorHook, ValidationOptions};
pub use report::{add_errors, ErrorKind, Validation, ValidationError};
pub use schema::{Definitions, Schema, TypeName, TypeSpec};
pub use validator::{validate, validate_json, Validator};
