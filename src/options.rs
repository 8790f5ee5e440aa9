//! Validation options
//!
//! One [`ValidationOptions`] value is threaded by reference through a whole
//! validation walk. It is never mutated during the walk: definitions declared
//! inside the schema are layered on top of [`ValidationOptions::definitions`]
//! by the validator itself, with the caller's entries taking precedence.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::format::{standard_registry, FormatRegistry};
use crate::report::ValidationError;
use crate::schema::{Definitions, Schema};

/// Observer invoked once per reported error, before it is recorded.
///
/// Arguments are the error, the schema node and value that produced it, and
/// the error path. Returning `Err` aborts validation with
/// [`SchemaError::Hook`](crate::error::SchemaError::Hook).
pub type ErrorHook =
    Arc<dyn Fn(&ValidationError, &Schema, &Value, &str) -> anyhow::Result<()> + Send + Sync>;

/// Default nesting limit for one validation walk
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling one validation call
#[derive(Clone)]
pub struct ValidationOptions {
    /// Check `format` constraints on strings
    pub validate_format: bool,
    /// Policy for object keys not covered by the schema, unless the schema
    /// sets `additionalProperties` itself
    pub additional_properties: bool,
    /// Policy for tuple elements past the declared items, unless the schema
    /// sets `additionalItems` itself
    pub additional_items: bool,
    /// Property names skipped at every object level
    pub omit_properties: Option<BTreeSet<String>>,
    /// Treat every `$ref` as valid
    pub omit_refs: bool,
    /// Caller-supplied definitions for `$ref`
    pub definitions: Definitions,
    pub on_error: Option<ErrorHook>,
    /// `None` uses the standard registry
    pub formats: Option<Arc<FormatRegistry>>,
    /// Deepest array/object nesting below the root; schema combinators add no levels
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            validate_format: false,
            additional_properties: true,
            additional_items: true,
            omit_properties: None,
            omit_refs: false,
            definitions: Definitions::new(),
            on_error: None,
            formats: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for ValidationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("validate_format", &self.validate_format)
            .field("additional_properties", &self.additional_properties)
            .field("additional_items", &self.additional_items)
            .field("omit_properties", &self.omit_properties)
            .field("omit_refs", &self.omit_refs)
            .field("definitions", &self.definitions.keys().collect::<Vec<_>>())
            .field("on_error", &self.on_error.is_some())
            .field("formats", &self.formats)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validate_format(mut self, enabled: bool) -> Self {
        self.validate_format = enabled;
        self
    }

    pub fn with_additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = allowed;
        self
    }

    pub fn with_additional_items(mut self, allowed: bool) -> Self {
        self.additional_items = allowed;
        self
    }

    pub fn with_omit_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit_properties = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_omit_refs(mut self, omit: bool) -> Self {
        self.omit_refs = omit;
        self
    }

    /// Add one definition, replacing any previous entry with that name
    pub fn with_definition(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.definitions.insert(name.into(), schema);
        self
    }

    /// Add definitions, replacing previous entries with the same names
    pub fn with_definitions(mut self, definitions: Definitions) -> Self {
        self.definitions.extend(definitions);
        self
    }

    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ValidationError, &Schema, &Value, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Some(Arc::new(formats));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The registry consulted for `format`
    pub fn format_registry(&self) -> &FormatRegistry {
        self.formats.as_deref().unwrap_or_else(|| standard_registry())
    }

    pub fn is_omitted(&self, property: &str) -> bool {
        self.omit_properties
            .as_ref()
            .is_some_and(|names| names.contains(property))
    }
}
