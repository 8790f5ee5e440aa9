//! Validation errors and reports
//!
//! A [`ValidationError`] describes one violation: where it happened (a
//! dot/bracket path into the value), which constraint failed, a readable
//! message, and the data needed to re-render that message. Errors are
//! collected in order and never deduplicated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Which constraint a [`ValidationError`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "unknownType")]
    UnknownType,
    #[serde(rename = "unionTypeNotValid")]
    UnionTypeNotValid,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "enumNoArray")]
    EnumNoArray,
    #[serde(rename = "pattern")]
    Pattern,
    #[serde(rename = "format")]
    Format,
    #[serde(rename = "unknownFormat")]
    UnknownFormat,
    #[serde(rename = "minLength")]
    MinLength,
    #[serde(rename = "maxLength")]
    MaxLength,
    #[serde(rename = "minimum")]
    Minimum,
    #[serde(rename = "maximum")]
    Maximum,
    #[serde(rename = "exclusiveMinimum")]
    ExclusiveMinimum,
    #[serde(rename = "exclusiveMaximum")]
    ExclusiveMaximum,
    #[serde(rename = "multipleOf")]
    MultipleOf,
    #[serde(rename = "minProperties")]
    MinProperties,
    #[serde(rename = "maxProperties")]
    MaxProperties,
    #[serde(rename = "dependency")]
    Dependency,
    #[serde(rename = "required")]
    Required,
    #[serde(rename = "additionalProperties")]
    AdditionalProperties,
    #[serde(rename = "minItems")]
    MinItems,
    #[serde(rename = "maxItems")]
    MaxItems,
    #[serde(rename = "uniqueItems")]
    UniqueItems,
    #[serde(rename = "additionalItems")]
    AdditionalItems,
    #[serde(rename = "itemNotValid")]
    ItemNotValid,
    #[serde(rename = "allOf")]
    AllOf,
    #[serde(rename = "anyOf")]
    AnyOf,
    /// More than one `oneOf` branch matched
    #[serde(rename = "oneOf")]
    OneOf,
    /// No `oneOf` branch matched
    #[serde(rename = "notOneOf")]
    NotOneOf,
    #[serde(rename = "$ref")]
    Ref,
}

impl ErrorKind {
    /// The stable identifier used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Type => "type",
            ErrorKind::UnknownType => "unknownType",
            ErrorKind::UnionTypeNotValid => "unionTypeNotValid",
            ErrorKind::Enum => "enum",
            ErrorKind::EnumNoArray => "enumNoArray",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Format => "format",
            ErrorKind::UnknownFormat => "unknownFormat",
            ErrorKind::MinLength => "minLength",
            ErrorKind::MaxLength => "maxLength",
            ErrorKind::Minimum => "minimum",
            ErrorKind::Maximum => "maximum",
            ErrorKind::ExclusiveMinimum => "exclusiveMinimum",
            ErrorKind::ExclusiveMaximum => "exclusiveMaximum",
            ErrorKind::MultipleOf => "multipleOf",
            ErrorKind::MinProperties => "minProperties",
            ErrorKind::MaxProperties => "maxProperties",
            ErrorKind::Dependency => "dependency",
            ErrorKind::Required => "required",
            ErrorKind::AdditionalProperties => "additionalProperties",
            ErrorKind::MinItems => "minItems",
            ErrorKind::MaxItems => "maxItems",
            ErrorKind::UniqueItems => "uniqueItems",
            ErrorKind::AdditionalItems => "additionalItems",
            ErrorKind::ItemNotValid => "itemNotValid",
            ErrorKind::AllOf => "allOf",
            ErrorKind::AnyOf => "anyOf",
            ErrorKind::OneOf => "oneOf",
            ErrorKind::NotOneOf => "notOneOf",
            ErrorKind::Ref => "$ref",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{}: {message}", display_path(.path))]
pub struct ValidationError {
    /// Location in the value, e.g. `.sections[2].caption`; empty for the root
    pub path: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Interpolation data for `message`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
            context: Map::new(),
        }
    }

    /// Attach one interpolation value
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// Append `new` to `errors`, preserving order
pub fn add_errors(errors: &mut Vec<ValidationError>, new: impl IntoIterator<Item = ValidationError>) {
    errors.extend(new);
}

/// The outcome of validating one value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Errors whose kind is `kind`
    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }
}

impl From<Vec<ValidationError>> for Validation {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}
