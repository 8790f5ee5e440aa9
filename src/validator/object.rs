//! Object constraints
//!
//! Checks run in a fixed order: key count, `required`, `dependencies`, then
//! every key of the value in its own order. Keys named in
//! `omit_properties` are invisible to all of them.

use serde_json::{Map, Value};

use super::{child_key, Walk};
use crate::error::Result;
use crate::report::{ErrorKind, ValidationError};
use crate::schema::{AdditionalProperties, Dependency, Schema};

impl<'a> Walk<'a> {
    pub(super) fn check_object(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let Some(map) = value.as_object() else {
            return self.type_mismatch(errors, "an object", schema, value, path);
        };

        self.property_count(schema, map, value, path, errors)?;
        self.required(schema, map, value, path, errors)?;
        self.dependencies(schema, map, value, path, errors)?;

        for (key, child) in map {
            if self.options.is_omitted(key) {
                continue;
            }
            let here = child_key(path, key);
            match schema.property(key) {
                Some(declared) => self.child(declared, child, &here, errors)?,
                None => self.residual(schema, key, child, &here, errors)?,
            }
        }

        Ok(())
    }

    fn property_count(
        &self,
        schema: &Schema,
        map: &Map<String, Value>,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if schema.min_properties.is_none() && schema.max_properties.is_none() {
            return Ok(());
        }
        let count = map.keys().filter(|key| !self.options.is_omitted(key)).count();

        if let Some(min) = schema.min_properties {
            if count < min {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MinProperties,
                        format!("Object has fewer properties than the minimum: {}", min),
                    )
                    .with_context("minProperties", min),
                    schema,
                    value,
                )?;
            }
        }
        if let Some(max) = schema.max_properties {
            if count > max {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MaxProperties,
                        format!("Object has more properties than the maximum: {}", max),
                    )
                    .with_context("maxProperties", max),
                    schema,
                    value,
                )?;
            }
        }
        Ok(())
    }

    /// The `required` list, then properties flagged `required: true`
    fn required(
        &self,
        schema: &Schema,
        map: &Map<String, Value>,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let flagged = schema
            .properties
            .iter()
            .flatten()
            .filter(|(name, sub)| sub.required_flag && !schema.required.contains(name))
            .map(|(name, _)| name);

        for name in schema.required.iter().chain(flagged) {
            if self.options.is_omitted(name) || map.contains_key(name) {
                continue;
            }
            self.report(
                errors,
                ValidationError::new(
                    child_key(path, name),
                    ErrorKind::Required,
                    format!("Required property is missing: {}", name),
                )
                .with_context("property", name.as_str()),
                schema,
                value,
            )?;
        }
        Ok(())
    }

    fn dependencies(
        &mut self,
        schema: &'a Schema,
        map: &Map<String, Value>,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let Some(dependencies) = &schema.dependencies else {
            return Ok(());
        };

        for (owner, dependency) in dependencies {
            if self.options.is_omitted(owner) || !map.contains_key(owner) {
                continue;
            }
            match dependency {
                Dependency::Keys(keys) => {
                    for key in keys {
                        if self.options.is_omitted(key) || map.contains_key(key) {
                            continue;
                        }
                        self.report(
                            errors,
                            ValidationError::new(
                                child_key(path, key),
                                ErrorKind::Dependency,
                                format!("Property {} is required by: {}", key, owner),
                            )
                            .with_context("property", key.as_str())
                            .with_context("dependant", owner.as_str()),
                            schema,
                            value,
                        )?;
                    }
                }
                Dependency::Schema(sub) => self.node(sub, value, path, errors)?,
                Dependency::Schemas(subs) => {
                    for sub in subs {
                        self.node(sub, value, path, errors)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// A key not declared in `properties`
    fn residual(
        &mut self,
        schema: &'a Schema,
        key: &str,
        child: &Value,
        here: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if let Some(patterns) = &schema.pattern_properties {
            if let Some(matched) = patterns.iter().find(|p| p.pattern.is_match(key)) {
                return self.child(&matched.schema, child, here, errors);
            }
            if schema.additional_properties.is_none() {
                return self.report(
                    errors,
                    ValidationError::new(
                        here,
                        ErrorKind::AdditionalProperties,
                        format!("Property does not match any pattern: {}", key),
                    )
                    .with_context("property", key),
                    schema,
                    child,
                );
            }
        }

        match &schema.additional_properties {
            Some(AdditionalProperties::Schema { schema: extra, by_name }) => {
                let target = by_name
                    .iter()
                    .find(|(name, _)| name == key)
                    .map_or(&**extra, |(_, sub)| sub);
                self.child(target, child, here, errors)
            }
            Some(AdditionalProperties::Allowed(true)) => Ok(()),
            None if self.options.additional_properties => Ok(()),
            Some(AdditionalProperties::Allowed(false)) | None => self.report(
                errors,
                ValidationError::new(
                    here,
                    ErrorKind::AdditionalProperties,
                    format!("Additional property is not allowed: {}", key),
                )
                .with_context("property", key),
                schema,
                child,
            ),
        }
    }
}
