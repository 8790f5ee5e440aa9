//! Validation engine
//!
//! Walks a schema and a value in lock-step, collecting every violation in one
//! pass. Each schema node goes through exactly one dispatch path, in this
//! order of precedence:
//!
//! 1. `enum`
//! 2. `oneOf`
//! 3. `allOf`
//! 4. `anyOf`
//! 5. `$ref`
//! 6. `type` (declared, or inferred from `properties` / `items`)
//!
//! A node with none of these accepts every value. A type mismatch suppresses
//! the remaining checks of that node; everything else is checked
//! independently. `anyOf`, `oneOf` and union types replace branch errors with
//! a single summary error.

mod array;
mod object;
mod scalar;

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::format::FormatRegistry;
use crate::options::ValidationOptions;
use crate::report::{ErrorKind, Validation, ValidationError};
use crate::schema::{Definitions, Schema, TypeName, TypeSpec};

/// Validate `value` against `schema`.
///
/// Returns every violation found, in order; an empty list means the value is
/// valid. `Err` is reserved for problems with the schema or the options
/// themselves.
pub fn validate(
    schema: &Schema,
    value: &Value,
    options: &ValidationOptions,
) -> Result<Vec<ValidationError>> {
    let mut walk = Walk::new(schema, options);
    let mut errors = Vec::new();
    walk.node(schema, value, "", &mut errors)?;
    tracing::debug!(
        errors = errors.len(),
        definitions = options.definitions.len(),
        "validation finished"
    );
    Ok(errors)
}

/// Parse `schema` and validate `value` against it
pub fn validate_json(schema: &Value, value: &Value, options: &ValidationOptions) -> Result<Validation> {
    let schema = Schema::from_json(schema)?;
    validate(&schema, value, options).map(Validation::from)
}

/// Reusable validator bound to one set of options
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    pub fn validate(&self, schema: &Schema, value: &Value) -> Result<Vec<ValidationError>> {
        validate(schema, value, &self.options)
    }

    /// Like [`Validator::validate`], packaged as a [`Validation`]
    pub fn check(&self, schema: &Schema, value: &Value) -> Result<Validation> {
        self.validate(schema, value).map(Validation::from)
    }

    pub fn is_valid(&self, schema: &Schema, value: &Value) -> Result<bool> {
        Ok(self.validate(schema, value)?.is_empty())
    }
}

// =============================================================================
// Walk State
// =============================================================================

/// Per-call state of one validation walk
struct Walk<'a> {
    root: &'a Schema,
    options: &'a ValidationOptions,
    formats: &'a FormatRegistry,
    /// Definitions declared by the schema nodes currently being visited,
    /// outermost first
    scopes: Vec<&'a Definitions>,
    /// `$ref` names being followed, with the path they were entered at
    visiting: HashSet<(String, String)>,
    /// Value nesting below the root
    depth: usize,
    /// Non-zero while evaluating branches whose errors are discarded
    muted: usize,
}

impl<'a> Walk<'a> {
    fn new(root: &'a Schema, options: &'a ValidationOptions) -> Self {
        Self {
            root,
            options,
            formats: options.format_registry(),
            scopes: Vec::new(),
            visiting: HashSet::new(),
            depth: 0,
            muted: 0,
        }
    }

    /// Validate one schema node against one value
    fn node(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        match &schema.definitions {
            Some(defs) => {
                self.scopes.push(defs);
                let outcome = self.dispatch(schema, value, path, errors);
                self.scopes.pop();
                outcome
            }
            None => self.dispatch(schema, value, path, errors),
        }
    }

    /// Validate an element or property one level below the current value
    fn child(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        self.descend(path, |walk| walk.node(schema, value, path, errors))
    }

    /// Run `f` one value level deeper, failing past `max_depth`
    fn descend<T, F>(&mut self, path: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.depth >= self.options.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.options.max_depth,
                path: path.to_string(),
            });
        }
        self.depth += 1;
        let outcome = f(self);
        self.depth -= 1;
        outcome
    }

    fn dispatch(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if let Some(allowed) = &schema.enum_values {
            return self.check_enum(schema, allowed, value, path, errors);
        }
        if let Some(branches) = &schema.one_of {
            return self.check_one_of(schema, branches, value, path, errors);
        }
        if let Some(branches) = &schema.all_of {
            for branch in branches {
                self.node(branch, value, path, errors)?;
            }
            return Ok(());
        }
        if let Some(branches) = &schema.any_of {
            return self.check_any_of(schema, branches, value, path, errors);
        }
        if let Some(name) = &schema.reference {
            return self.check_ref(schema, name, value, path, errors);
        }

        match schema.effective_type().as_deref() {
            None => Ok(()),
            Some(TypeSpec::Single(name)) => self.check_type(name, schema, value, path, errors),
            Some(TypeSpec::Union(names)) => self.check_union(names, schema, value, path, errors),
        }
    }

    /// Record an error, notifying the hook unless the current branch is muted
    fn report(
        &self,
        errors: &mut Vec<ValidationError>,
        error: ValidationError,
        schema: &Schema,
        value: &Value,
    ) -> Result<()> {
        if self.muted == 0 {
            if let Some(hook) = &self.options.on_error {
                hook(&error, schema, value, &error.path).map_err(SchemaError::Hook)?;
            }
        }
        errors.push(error);
        Ok(())
    }

    /// Run `f` with errors collected privately; true when it reported none
    fn quietly<F>(&mut self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Self, &mut Vec<ValidationError>) -> Result<()>,
    {
        let mut scratch = Vec::new();
        self.muted += 1;
        let outcome = f(self, &mut scratch);
        self.muted -= 1;
        outcome?;
        Ok(scratch.is_empty())
    }

    fn matches(&mut self, schema: &'a Schema, value: &Value, path: &str) -> Result<bool> {
        self.quietly(|walk, scratch| walk.node(schema, value, path, scratch))
    }

    // =========================================================================
    // Type Dispatch
    // =========================================================================

    fn check_type(
        &mut self,
        name: &TypeName,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        match name {
            TypeName::Boolean => {
                if !value.is_boolean() {
                    self.type_mismatch(errors, "a boolean", schema, value, path)?;
                }
                Ok(())
            }
            TypeName::Null => {
                if !value.is_null() {
                    self.type_mismatch(errors, "null", schema, value, path)?;
                }
                Ok(())
            }
            TypeName::Number => self.check_number(schema, value, path, errors),
            TypeName::Integer => self.check_integer(schema, value, path, errors),
            TypeName::String => self.check_string(schema, value, path, errors),
            TypeName::Array => self.check_array(schema, value, path, errors),
            TypeName::Object => self.check_object(schema, value, path, errors),
            TypeName::Any => Ok(()),
            TypeName::Unknown(unknown) => self.report(
                errors,
                ValidationError::new(path, ErrorKind::UnknownType, format!("Unknown type: {}", unknown))
                    .with_context("type", unknown.as_str()),
                schema,
                value,
            ),
        }
    }

    fn check_union(
        &mut self,
        names: &[TypeName],
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        for name in names {
            if self.quietly(|walk, scratch| walk.check_type(name, schema, value, path, scratch))? {
                return Ok(());
            }
        }
        let listed: Vec<Value> = names.iter().map(|n| Value::from(n.as_str())).collect();
        let message = format!(
            "Value does not match any of the types: {}",
            names.iter().map(TypeName::as_str).collect::<Vec<_>>().join(", ")
        );
        self.report(
            errors,
            ValidationError::new(path, ErrorKind::UnionTypeNotValid, message)
                .with_context("types", listed),
            schema,
            value,
        )
    }

    fn type_mismatch(
        &self,
        errors: &mut Vec<ValidationError>,
        expected: &str,
        schema: &Schema,
        value: &Value,
        path: &str,
    ) -> Result<()> {
        self.report(
            errors,
            ValidationError::new(path, ErrorKind::Type, format!("Value is not {}", expected))
                .with_context("expected", expected),
            schema,
            value,
        )
    }

    // =========================================================================
    // Combinators
    // =========================================================================

    fn check_enum(
        &mut self,
        schema: &'a Schema,
        allowed: &Value,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let Value::Array(items) = allowed else {
            return self.report(
                errors,
                ValidationError::new(path, ErrorKind::EnumNoArray, "Enum must be an array of values"),
                schema,
                value,
            );
        };
        if items.iter().any(|item| json_equal(item, value)) {
            return Ok(());
        }
        self.report(
            errors,
            ValidationError::new(path, ErrorKind::Enum, format!("Not a valid enumeration item: {}", value))
                .with_context("value", value.clone()),
            schema,
            value,
        )
    }

    fn check_any_of(
        &mut self,
        schema: &'a Schema,
        branches: &'a [Schema],
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        for (i, branch) in branches.iter().enumerate() {
            if self.matches(branch, value, path)? {
                tracing::trace!(path, branch = i, "anyOf matched");
                return Ok(());
            }
        }
        self.report(
            errors,
            ValidationError::new(path, ErrorKind::AnyOf, "Value does not match any of the schemas")
                .with_context("branches", branches.len()),
            schema,
            value,
        )
    }

    fn check_one_of(
        &mut self,
        schema: &'a Schema,
        branches: &'a [Schema],
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let mut matched = 0usize;
        for branch in branches {
            if self.matches(branch, value, path)? {
                matched += 1;
            }
        }
        tracing::trace!(path, matched, "oneOf evaluated");

        let error = match matched {
            1 => return Ok(()),
            0 => ValidationError::new(
                path,
                ErrorKind::NotOneOf,
                "Value does not validate against any of the schemas",
            ),
            _ => ValidationError::new(
                path,
                ErrorKind::OneOf,
                "Value validates against more than one of the schemas",
            ),
        };
        self.report(errors, error.with_context("matched", matched), schema, value)
    }

    fn check_ref(
        &mut self,
        schema: &'a Schema,
        name: &str,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if self.options.omit_refs {
            return Ok(());
        }

        let Some(target) = self.resolve(name) else {
            tracing::trace!(path, reference = name, "unresolved reference");
            return self.report(
                errors,
                ValidationError::new(
                    path,
                    ErrorKind::Ref,
                    format!("Definition of schema reference not found: {}", name),
                )
                .with_context("ref", name),
                schema,
                value,
            );
        };

        let key = (name.to_string(), path.to_string());
        if !self.visiting.insert(key.clone()) {
            return Err(SchemaError::RefCycle {
                name: name.to_string(),
                path: path.to_string(),
            });
        }
        tracing::trace!(path, reference = name, "following reference");
        let outcome = self.node(target, value, path, errors);
        self.visiting.remove(&key);
        outcome
    }

    /// Find the schema a `$ref` names. Caller definitions win over
    /// schema-declared ones; outer declarations win over inner ones.
    fn resolve(&self, name: &str) -> Option<&'a Schema> {
        if name == "#" {
            return Some(self.root);
        }
        let key = name.strip_prefix("#/definitions/").unwrap_or(name);
        self.options
            .definitions
            .get(key)
            .or_else(|| self.scopes.iter().find_map(|defs| defs.get(key)))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Structural equality for JSON values. Numbers compare by value (`1 == 1.0`),
/// object key order is irrelevant.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}

fn child_key(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

fn child_index(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}
