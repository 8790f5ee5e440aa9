//! Schema types and parsing
//!
//! A [`Schema`] is the immutable, typed form of a JSON schema document. It is
//! parsed once from a `serde_json::Value` and then shared read-only by any
//! number of validations. Keys the validator does not interpret are kept as
//! custom attributes.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

/// Name-indexed table of reusable schemas
pub type Definitions = BTreeMap<String, Schema>;

// =============================================================================
// Type Names
// =============================================================================

/// Primitive type name of a schema node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Boolean,
    Number,
    Integer,
    String,
    Null,
    Array,
    Object,
    /// Unconstrained slot
    Any,
    /// A name the validator does not know; reported when dispatched
    Unknown(String),
}

impl TypeName {
    pub fn parse(name: &str) -> Self {
        match name {
            "boolean" => Self::Boolean,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "string" => Self::String,
            "null" => Self::Null,
            "array" => Self::Array,
            "object" => Self::Object,
            "any" => Self::Any,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Get the schema keyword for this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Null => "null",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
            Self::Unknown(name) => name,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `type` keyword: a single name or a union of names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    Single(TypeName),
    Union(Vec<TypeName>),
}

// =============================================================================
// Constraint Shapes
// =============================================================================

/// A compiled regular expression together with its source text
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    fn compile(source: &str, path: &str) -> Result<Self> {
        let regex = Regex::new(source).map_err(|source| SchemaError::InvalidPattern {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// `exclusiveMinimum` / `exclusiveMaximum`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exclusive {
    /// Boolean form: turns the paired `minimum`/`maximum` into a strict bound
    Flag(bool),
    /// Numeric form: a strict bound of its own
    Bound(f64),
}

/// The `items` keyword
#[derive(Debug, Clone)]
pub enum Items {
    /// Every element validates against one schema
    Single(Box<Schema>),
    /// Element `i` validates against schema `i`
    Tuple(Vec<Schema>),
}

/// The `additionalItems` keyword
#[derive(Debug, Clone)]
pub enum AdditionalItems {
    Allowed(bool),
    Schema(Box<Schema>),
    /// Each additional element must match at least one of these
    AnyOf(Vec<Schema>),
}

/// The `additionalProperties` keyword
#[derive(Debug, Clone)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema {
        schema: Box<Schema>,
        /// Object-valued entries keyed by property name, consulted before
        /// falling back to `schema` as a whole
        by_name: Vec<(String, Schema)>,
    },
}

/// One entry of `patternProperties`
#[derive(Debug, Clone)]
pub struct PatternProperty {
    pub pattern: Pattern,
    pub schema: Schema,
}

/// One entry of `dependencies`
#[derive(Debug, Clone)]
pub enum Dependency {
    /// Keys that must be present alongside the owning key
    Keys(Vec<String>),
    /// The whole object must also validate against this schema
    Schema(Box<Schema>),
    /// The whole object must also validate against every one of these
    Schemas(Vec<Schema>),
}

// =============================================================================
// Schema
// =============================================================================

/// A parsed schema node
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub kind: Option<TypeSpec>,

    // meta
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub definitions: Option<Definitions>,

    // combinators
    /// Raw `enum` value; a non-array is reported during validation
    pub enum_values: Option<Value>,
    pub all_of: Option<Vec<Schema>>,
    pub any_of: Option<Vec<Schema>>,
    pub one_of: Option<Vec<Schema>>,
    pub reference: Option<String>,

    // number / integer
    pub multiple_of: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<Exclusive>,
    pub exclusive_maximum: Option<Exclusive>,

    // string
    pub pattern: Option<Pattern>,
    pub format: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,

    // array
    pub items: Option<Items>,
    pub additional_items: Option<AdditionalItems>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,

    // object
    pub properties: Option<Vec<(String, Schema)>>,
    pub pattern_properties: Option<Vec<PatternProperty>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub required: Vec<String>,
    /// Legacy `required: true` on a property sub-schema
    pub required_flag: bool,
    pub min_properties: Option<usize>,
    pub max_properties: Option<usize>,
    pub dependencies: Option<Vec<(String, Dependency)>>,

    /// Keys not interpreted by the validator, in document order
    pub custom: Map<String, Value>,
}

impl Schema {
    /// Parse a schema from a JSON value. `null` parses to the empty schema.
    pub fn from_json(value: &Value) -> Result<Self> {
        parse_node(value, "#")
    }

    /// Parse a schema from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Schema with only a `type`
    pub fn of_type(name: TypeName) -> Self {
        Self {
            kind: Some(TypeSpec::Single(name)),
            ..Default::default()
        }
    }

    /// The declared type, or the type inferred from `properties` / `items`.
    ///
    /// Never writes the inferred type back; the schema stays shareable.
    pub fn effective_type(&self) -> Option<Cow<'_, TypeSpec>> {
        if let Some(kind) = &self.kind {
            return Some(Cow::Borrowed(kind));
        }
        if self.properties.is_some() {
            Some(Cow::Owned(TypeSpec::Single(TypeName::Object)))
        } else if self.items.is_some() {
            Some(Cow::Owned(TypeSpec::Single(TypeName::Array)))
        } else {
            None
        }
    }

    /// Look up a declared property schema
    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties
            .as_ref()?
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    /// Keys preserved verbatim because the validator does not interpret them
    pub fn custom_attributes(&self) -> &Map<String, Value> {
        &self.custom
    }

    /// Whether the node declares any combinator
    pub fn is_combinator(&self) -> bool {
        self.enum_values.is_some()
            || self.one_of.is_some()
            || self.all_of.is_some()
            || self.any_of.is_some()
            || self.reference.is_some()
    }
}

impl TryFrom<&Value> for Schema {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_json(value)
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn parse_node(value: &Value, at: &str) -> Result<Schema> {
    let obj = match value {
        Value::Null => return Ok(Schema::default()),
        Value::Object(obj) => obj,
        other => {
            return Err(SchemaError::invalid(
                at,
                format!("expected an object, found {}", json_kind(other)),
            ))
        }
    };

    let mut schema = Schema::default();

    for (key, val) in obj {
        let here = format!("{}/{}", at, key);
        match key.as_str() {
            "type" => schema.kind = Some(parse_type(val, &here)?),
            // meta text is never validated; other shapes are kept verbatim
            "title" | "description" => match (key.as_str(), val.as_str()) {
                ("title", Some(text)) => schema.title = Some(text.to_string()),
                ("description", Some(text)) => schema.description = Some(text.to_string()),
                _ => {
                    schema.custom.insert(key.clone(), val.clone());
                }
            },
            "default" => schema.default = Some(val.clone()),
            "definitions" => schema.definitions = Some(parse_definitions(val, &here)?),

            "enum" => schema.enum_values = Some(val.clone()),
            "allOf" => schema.all_of = Some(parse_schema_list(val, &here)?),
            "anyOf" => schema.any_of = Some(parse_schema_list(val, &here)?),
            "oneOf" => schema.one_of = Some(parse_schema_list(val, &here)?),
            "$ref" => schema.reference = Some(expect_str(val, &here)?.to_string()),

            "multipleOf" => {
                let n = expect_number(val, &here)?;
                if n <= 0.0 {
                    return Err(SchemaError::invalid(here, "multipleOf must be greater than 0"));
                }
                schema.multiple_of = Some(n);
            }
            "minimum" => schema.minimum = Some(expect_number(val, &here)?),
            "maximum" => schema.maximum = Some(expect_number(val, &here)?),
            "exclusiveMinimum" => schema.exclusive_minimum = Some(parse_exclusive(val, &here)?),
            "exclusiveMaximum" => schema.exclusive_maximum = Some(parse_exclusive(val, &here)?),

            "pattern" => schema.pattern = Some(Pattern::compile(expect_str(val, &here)?, &here)?),
            "format" => schema.format = Some(expect_str(val, &here)?.to_string()),
            "minLength" => schema.min_length = Some(expect_count(val, &here)?),
            "maxLength" => schema.max_length = Some(expect_count(val, &here)?),

            "items" => schema.items = Some(parse_items(val, &here)?),
            "additionalItems" => schema.additional_items = Some(parse_additional_items(val, &here)?),
            "minItems" => schema.min_items = Some(expect_count(val, &here)?),
            "maxItems" => schema.max_items = Some(expect_count(val, &here)?),
            "uniqueItems" => schema.unique_items = expect_bool(val, &here)?,

            "properties" => schema.properties = Some(parse_schema_map(val, &here)?),
            "patternProperties" => schema.pattern_properties = Some(parse_pattern_properties(val, &here)?),
            "additionalProperties" => {
                schema.additional_properties = Some(parse_additional_properties(val, &here)?)
            }
            "required" => match val {
                Value::Bool(flag) => schema.required_flag = *flag,
                Value::Array(_) => schema.required = parse_key_list(val, &here)?,
                other => {
                    return Err(SchemaError::invalid(
                        here,
                        format!("expected a boolean or an array of names, found {}", json_kind(other)),
                    ))
                }
            },
            "minProperties" => schema.min_properties = Some(expect_count(val, &here)?),
            "maxProperties" => schema.max_properties = Some(expect_count(val, &here)?),
            "dependencies" => schema.dependencies = Some(parse_dependencies(val, &here)?),

            _ => {
                schema.custom.insert(key.clone(), val.clone());
            }
        }
    }

    Ok(schema)
}

fn parse_type(value: &Value, at: &str) -> Result<TypeSpec> {
    match value {
        Value::String(name) => Ok(TypeSpec::Single(TypeName::parse(name))),
        Value::Array(names) => names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                expect_str(name, &format!("{}/{}", at, i)).map(TypeName::parse)
            })
            .collect::<Result<Vec<_>>>()
            .map(TypeSpec::Union),
        other => Err(SchemaError::invalid(
            at,
            format!("expected a type name or an array of type names, found {}", json_kind(other)),
        )),
    }
}

fn parse_exclusive(value: &Value, at: &str) -> Result<Exclusive> {
    match value {
        Value::Bool(flag) => Ok(Exclusive::Flag(*flag)),
        Value::Number(_) => Ok(Exclusive::Bound(expect_number(value, at)?)),
        other => Err(SchemaError::invalid(
            at,
            format!("expected a boolean or a number, found {}", json_kind(other)),
        )),
    }
}

fn parse_items(value: &Value, at: &str) -> Result<Items> {
    match value {
        Value::Array(_) => Ok(Items::Tuple(parse_schema_list(value, at)?)),
        _ => Ok(Items::Single(Box::new(parse_node(value, at)?))),
    }
}

fn parse_additional_items(value: &Value, at: &str) -> Result<AdditionalItems> {
    match value {
        Value::Bool(allowed) => Ok(AdditionalItems::Allowed(*allowed)),
        Value::Array(_) => Ok(AdditionalItems::AnyOf(parse_schema_list(value, at)?)),
        _ => Ok(AdditionalItems::Schema(Box::new(parse_node(value, at)?))),
    }
}

fn parse_additional_properties(value: &Value, at: &str) -> Result<AdditionalProperties> {
    if let Value::Bool(allowed) = value {
        return Ok(AdditionalProperties::Allowed(*allowed));
    }
    let schema = parse_node(value, at)?;
    // Uninterpreted object-valued keys double as per-name schemas
    let by_name = schema
        .custom
        .iter()
        .filter(|(_, val)| val.is_object())
        .map(|(name, val)| Ok((name.clone(), parse_node(val, &format!("{}/{}", at, name))?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(AdditionalProperties::Schema {
        schema: Box::new(schema),
        by_name,
    })
}

fn parse_dependencies(value: &Value, at: &str) -> Result<Vec<(String, Dependency)>> {
    let obj = expect_object(value, at)?;
    let mut deps = Vec::with_capacity(obj.len());

    for (owner, spec) in obj {
        let here = format!("{}/{}", at, owner);
        let dep = match spec {
            Value::String(key) => Dependency::Keys(vec![key.clone()]),
            Value::Array(entries) if entries.iter().all(Value::is_string) => {
                Dependency::Keys(parse_key_list(spec, &here)?)
            }
            Value::Array(entries) if entries.iter().all(Value::is_object) => {
                Dependency::Schemas(parse_schema_list(spec, &here)?)
            }
            Value::Array(_) => {
                return Err(SchemaError::invalid(
                    here,
                    "dependency list must hold only names or only schemas",
                ))
            }
            _ => Dependency::Schema(Box::new(parse_node(spec, &here)?)),
        };
        deps.push((owner.clone(), dep));
    }

    Ok(deps)
}

fn parse_pattern_properties(value: &Value, at: &str) -> Result<Vec<PatternProperty>> {
    expect_object(value, at)?
        .iter()
        .map(|(source, sub)| {
            let here = format!("{}/{}", at, source);
            Ok(PatternProperty {
                pattern: Pattern::compile(source, &here)?,
                schema: parse_node(sub, &here)?,
            })
        })
        .collect()
}

fn parse_definitions(value: &Value, at: &str) -> Result<Definitions> {
    Ok(parse_schema_map(value, at)?.into_iter().collect())
}

fn parse_schema_map(value: &Value, at: &str) -> Result<Vec<(String, Schema)>> {
    expect_object(value, at)?
        .iter()
        .map(|(key, sub)| Ok((key.clone(), parse_node(sub, &format!("{}/{}", at, key))?)))
        .collect()
}

fn parse_schema_list(value: &Value, at: &str) -> Result<Vec<Schema>> {
    let Value::Array(entries) = value else {
        return Err(SchemaError::invalid(
            at,
            format!("expected an array of schemas, found {}", json_kind(value)),
        ));
    };
    entries
        .iter()
        .enumerate()
        .map(|(i, sub)| parse_node(sub, &format!("{}/{}", at, i)))
        .collect()
}

fn parse_key_list(value: &Value, at: &str) -> Result<Vec<String>> {
    let Value::Array(entries) = value else {
        return Err(SchemaError::invalid(at, "expected an array of property names"));
    };
    entries
        .iter()
        .enumerate()
        .map(|(i, key)| expect_str(key, &format!("{}/{}", at, i)).map(str::to_string))
        .collect()
}

fn expect_object<'v>(value: &'v Value, at: &str) -> Result<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        SchemaError::invalid(at, format!("expected an object, found {}", json_kind(value)))
    })
}

fn expect_str<'v>(value: &'v Value, at: &str) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        SchemaError::invalid(at, format!("expected a string, found {}", json_kind(value)))
    })
}

fn expect_bool(value: &Value, at: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        SchemaError::invalid(at, format!("expected a boolean, found {}", json_kind(value)))
    })
}

fn expect_number(value: &Value, at: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        SchemaError::invalid(at, format!("expected a number, found {}", json_kind(value)))
    })
}

fn expect_count(value: &Value, at: &str) -> Result<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| SchemaError::invalid(at, "expected a non-negative integer"))
}

/// Name of a JSON value's kind, for messages
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_empty_parse_to_empty_schema() {
        for value in [json!(null), json!({})] {
            let schema = Schema::from_json(&value).unwrap();
            assert!(schema.effective_type().is_none());
            assert!(!schema.is_combinator());
        }
    }

    #[test]
    fn test_type_inference_does_not_mutate() {
        let schema = Schema::from_json(&json!({"properties": {"a": {}}})).unwrap();
        assert_eq!(
            schema.effective_type().as_deref(),
            Some(&TypeSpec::Single(TypeName::Object))
        );
        assert!(schema.kind.is_none());

        let schema = Schema::from_json(&json!({"items": {"type": "string"}})).unwrap();
        assert_eq!(
            schema.effective_type().as_deref(),
            Some(&TypeSpec::Single(TypeName::Array))
        );
    }

    #[test]
    fn test_union_and_unknown_type_names() {
        let schema = Schema::from_json(&json!({"type": ["string", "thing"]})).unwrap();
        assert_eq!(
            schema.kind,
            Some(TypeSpec::Union(vec![
                TypeName::String,
                TypeName::Unknown("thing".into())
            ]))
        );
    }

    #[test]
    fn test_custom_attributes_preserved_in_order() {
        let schema = Schema::from_json(&json!({"$ref": "foo", "foo": "bar", "x-ui": 3})).unwrap();
        let keys: Vec<_> = schema.custom_attributes().keys().cloned().collect();
        assert_eq!(keys, vec!["foo", "x-ui"]);
        assert_eq!(schema.reference.as_deref(), Some("foo"));
    }

    #[test]
    fn test_required_forms() {
        let list = Schema::from_json(&json!({"required": ["a", "b"]})).unwrap();
        assert_eq!(list.required, vec!["a", "b"]);
        assert!(!list.required_flag);

        let flag = Schema::from_json(&json!({"type": "string", "required": true})).unwrap();
        assert!(flag.required_flag);
        assert!(flag.required.is_empty());
    }

    #[test]
    fn test_dependency_forms() {
        let schema = Schema::from_json(&json!({
            "dependencies": {
                "a": "b",
                "b": ["a", "c"],
                "c": {"required": ["a"]},
                "d": [{"required": ["a"]}, {"required": ["b"]}]
            }
        }))
        .unwrap();
        let deps = schema.dependencies.unwrap();
        assert!(matches!(&deps[0].1, Dependency::Keys(keys) if keys == &["b"]));
        assert!(matches!(&deps[1].1, Dependency::Keys(keys) if keys.len() == 2));
        assert!(matches!(&deps[2].1, Dependency::Schema(_)));
        assert!(matches!(&deps[3].1, Dependency::Schemas(list) if list.len() == 2));
    }

    #[test]
    fn test_additional_properties_by_name() {
        let schema = Schema::from_json(&json!({
            "additionalProperties": {"baz": {"type": "string"}}
        }))
        .unwrap();
        match schema.additional_properties {
            Some(AdditionalProperties::Schema { by_name, .. }) => {
                assert_eq!(by_name.len(), 1);
                assert_eq!(by_name[0].0, "baz");
            }
            other => panic!("Expected schema-valued additionalProperties, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_by_name_entry_is_fatal() {
        match Schema::from_json(&json!({"additionalProperties": {"a": {"pattern": "("}}})) {
            Err(SchemaError::InvalidPattern { path, .. }) => {
                assert_eq!(path, "#/additionalProperties/a/pattern");
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_non_text_meta_is_kept_verbatim() {
        let schema = Schema::from_json(&json!({
            "type": "string",
            "title": 5,
            "description": {"en": "Name"}
        }))
        .unwrap();
        assert!(schema.title.is_none());
        assert!(schema.description.is_none());
        assert_eq!(schema.custom_attributes().get("title"), Some(&json!(5)));
        assert_eq!(schema.custom_attributes().get("description"), Some(&json!({"en": "Name"})));

        let text = Schema::from_json(&json!({"title": "Name", "description": "Full name"})).unwrap();
        assert_eq!(text.title.as_deref(), Some("Name"));
        assert_eq!(text.description.as_deref(), Some("Full name"));
        assert!(text.custom_attributes().is_empty());
    }

    #[test]
    fn test_malformed_schemas_are_fatal() {
        assert!(matches!(
            Schema::from_json(&json!(42)),
            Err(SchemaError::InvalidSchema { .. })
        ));
        assert!(matches!(
            Schema::from_json(&json!({"minLength": -1})),
            Err(SchemaError::InvalidSchema { .. })
        ));
        assert!(matches!(
            Schema::from_json(&json!({"multipleOf": 0})),
            Err(SchemaError::InvalidSchema { .. })
        ));
        match Schema::from_json(&json!({"properties": {"a": {"pattern": "("}}})) {
            Err(SchemaError::InvalidPattern { path, .. }) => {
                assert_eq!(path, "#/properties/a/pattern");
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_kept_raw() {
        let schema = Schema::from_json(&json!({"enum": "not-a-list"})).unwrap();
        assert_eq!(schema.enum_values, Some(json!("not-a-list")));
    }
}
