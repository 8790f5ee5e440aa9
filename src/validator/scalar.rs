//! Number, integer and string constraints

use serde_json::Value;

use super::Walk;
use crate::error::Result;
use crate::report::{ErrorKind, ValidationError};
use crate::schema::{Exclusive, Schema};

impl<'a> Walk<'a> {
    pub(super) fn check_number(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        match value.as_f64() {
            Some(n) => self.number_bounds(schema, n, value, path, errors),
            None => self.type_mismatch(errors, "a number", schema, value, path),
        }
    }

    pub(super) fn check_integer(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        match value.as_f64() {
            Some(n) if n.ceil() == n => self.number_bounds(schema, n, value, path, errors),
            _ => self.type_mismatch(errors, "an integer", schema, value, path),
        }
    }

    /// multipleOf, then the lower bound, then the upper bound
    fn number_bounds(
        &mut self,
        schema: &'a Schema,
        n: f64,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        if let Some(m) = schema.multiple_of {
            if !is_multiple_of(n, m) {
                self.report(
                    errors,
                    ValidationError::new(path, ErrorKind::MultipleOf, format!("Value is not a multiple of: {}", m))
                        .with_context("multipleOf", m),
                    schema,
                    value,
                )?;
            }
        }

        let exclusive_min = matches!(schema.exclusive_minimum, Some(Exclusive::Flag(true)));
        if let Some(m) = schema.minimum {
            if exclusive_min && n <= m {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::ExclusiveMinimum,
                        format!("Value is less than or equal to the exclusive minimum: {}", m),
                    )
                    .with_context("minimum", m),
                    schema,
                    value,
                )?;
            } else if n < m {
                self.report(
                    errors,
                    ValidationError::new(path, ErrorKind::Minimum, format!("Value is less than minimum: {}", m))
                        .with_context("minimum", m),
                    schema,
                    value,
                )?;
            }
        }
        if let Some(Exclusive::Bound(m)) = schema.exclusive_minimum {
            if n <= m {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::ExclusiveMinimum,
                        format!("Value is less than or equal to the exclusive minimum: {}", m),
                    )
                    .with_context("exclusiveMinimum", m),
                    schema,
                    value,
                )?;
            }
        }

        let exclusive_max = matches!(schema.exclusive_maximum, Some(Exclusive::Flag(true)));
        if let Some(m) = schema.maximum {
            if exclusive_max && n >= m {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::ExclusiveMaximum,
                        format!("Value is greater than or equal to the exclusive maximum: {}", m),
                    )
                    .with_context("maximum", m),
                    schema,
                    value,
                )?;
            } else if n > m {
                self.report(
                    errors,
                    ValidationError::new(path, ErrorKind::Maximum, format!("Value is greater than the maximum: {}", m))
                        .with_context("maximum", m),
                    schema,
                    value,
                )?;
            }
        }
        if let Some(Exclusive::Bound(m)) = schema.exclusive_maximum {
            if n >= m {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::ExclusiveMaximum,
                        format!("Value is greater than or equal to the exclusive maximum: {}", m),
                    )
                    .with_context("exclusiveMaximum", m),
                    schema,
                    value,
                )?;
            }
        }

        Ok(())
    }

    pub(super) fn check_string(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let Some(s) = value.as_str() else {
            return self.type_mismatch(errors, "a string", schema, value, path);
        };

        if let Some(pattern) = &schema.pattern {
            if !pattern.is_match(s) {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::Pattern,
                        format!("Value does not match pattern: {}", pattern.as_str()),
                    )
                    .with_context("pattern", pattern.as_str()),
                    schema,
                    value,
                )?;
            }
        }

        if self.options.validate_format {
            if let Some(format) = &schema.format {
                let error = match self.formats.check(format, s) {
                    Some(true) => None,
                    Some(false) => Some(ValidationError::new(
                        path,
                        ErrorKind::Format,
                        format!("Value does not match format: {}", format),
                    )),
                    None => Some(ValidationError::new(
                        path,
                        ErrorKind::UnknownFormat,
                        format!("Unknown format: {}", format),
                    )),
                };
                if let Some(error) = error {
                    self.report(errors, error.with_context("format", format.as_str()), schema, value)?;
                }
            }
        }

        let length = s.chars().count();
        if let Some(min) = schema.min_length {
            if length < min {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MinLength,
                        format!("Value is shorter than the minimum length: {}", min),
                    )
                    .with_context("minLength", min),
                    schema,
                    value,
                )?;
            }
        }
        if let Some(max) = schema.max_length {
            if length > max {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MaxLength,
                        format!("Value is longer than the maximum length: {}", max),
                    )
                    .with_context("maxLength", max),
                    schema,
                    value,
                )?;
            }
        }

        Ok(())
    }
}

/// Relative slack for binary fractions such as `0.3 / 0.1`
const MULTIPLE_TOLERANCE: f64 = 1e-9;

/// Whether `n / m` is integral, up to floating-point representation error
fn is_multiple_of(n: f64, m: f64) -> bool {
    let quotient = n / m;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= MULTIPLE_TOLERANCE * quotient.abs().max(1.0)
}

#[cfg(test)]
mod tests {
    use super::is_multiple_of;
    use crate::format::FormatRegistry;
    use crate::options::ValidationOptions;
    use crate::report::{ErrorKind, ValidationError};
    use crate::schema::Schema;
    use crate::validator::validate;
    use serde_json::{json, Value};

    fn run(schema: Value, value: Value) -> Vec<ValidationError> {
        run_with(schema, value, &ValidationOptions::default())
    }

    fn run_with(schema: Value, value: Value, options: &ValidationOptions) -> Vec<ValidationError> {
        let schema = Schema::from_json(&schema).unwrap();
        validate(&schema, &value, options).unwrap()
    }

    fn kinds(errors: &[ValidationError]) -> Vec<ErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_boolean_and_null() {
        assert!(run(json!({"type": "boolean"}), json!(false)).is_empty());
        assert_eq!(kinds(&run(json!({"type": "boolean"}), json!(0))), vec![ErrorKind::Type]);
        assert!(run(json!({"type": "null"}), json!(null)).is_empty());
        assert_eq!(kinds(&run(json!({"type": "null"}), json!(""))), vec![ErrorKind::Type]);
        assert!(run(json!({"type": "any"}), json!({"x": [1]})).is_empty());
    }

    #[test]
    fn test_number_type() {
        assert!(run(json!({"type": "number"}), json!(1.5)).is_empty());
        let errors = run(json!({"type": "number", "minimum": 3}), json!("1"));
        assert_eq!(kinds(&errors), vec![ErrorKind::Type]);
        assert_eq!(errors[0].message, "Value is not a number");
    }

    #[test]
    fn test_integer_below_minimum_is_not_a_type_error() {
        let errors = run(json!({"type": "integer", "minimum": 3}), json!(2));
        assert_eq!(kinds(&errors), vec![ErrorKind::Minimum]);
        assert_eq!(errors[0].message, "Value is less than minimum: 3");
    }

    #[test]
    fn test_integer_rejects_fractions() {
        assert!(run(json!({"type": "integer"}), json!(4.0)).is_empty());
        assert_eq!(kinds(&run(json!({"type": "integer"}), json!(4.5))), vec![ErrorKind::Type]);
    }

    #[test]
    fn test_number_constraints_are_independent() {
        let errors = run(json!({"type": "number", "multipleOf": 5, "maximum": 10}), json!(12));
        assert_eq!(kinds(&errors), vec![ErrorKind::MultipleOf, ErrorKind::Maximum]);
        assert_eq!(errors[0].message, "Value is not a multiple of: 5");
        assert_eq!(errors[1].message, "Value is greater than the maximum: 10");
    }

    #[test]
    fn test_multiple_of_fractional() {
        assert!(run(json!({"type": "number", "multipleOf": 2.5}), json!(7.5)).is_empty());
        assert_eq!(
            kinds(&run(json!({"type": "number", "multipleOf": 2.5}), json!(7))),
            vec![ErrorKind::MultipleOf]
        );
    }

    #[test]
    fn test_multiple_of_decimal_fractions() {
        assert!(is_multiple_of(0.3, 0.1));
        assert!(is_multiple_of(19.99, 0.01));
        assert!(is_multiple_of(-4.5, 1.5));
        assert!(!is_multiple_of(0.35, 0.1));
        assert!(!is_multiple_of(1.0, 3.0));

        let schema = json!({"type": "number", "multipleOf": 0.1});
        assert!(run(schema.clone(), json!(0.3)).is_empty());
        assert_eq!(kinds(&run(schema, json!(0.35))), vec![ErrorKind::MultipleOf]);
    }

    #[test]
    fn test_exclusive_flags() {
        let schema = json!({"type": "number", "minimum": 1, "exclusiveMinimum": true,
                            "maximum": 5, "exclusiveMaximum": true});
        assert!(run(schema.clone(), json!(3)).is_empty());
        assert_eq!(kinds(&run(schema.clone(), json!(1))), vec![ErrorKind::ExclusiveMinimum]);
        assert_eq!(kinds(&run(schema, json!(5))), vec![ErrorKind::ExclusiveMaximum]);

        let inclusive = json!({"type": "number", "minimum": 1, "exclusiveMinimum": false});
        assert!(run(inclusive, json!(1)).is_empty());
    }

    #[test]
    fn test_exclusive_bounds() {
        let schema = json!({"type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 10});
        assert!(run(schema.clone(), json!(0.5)).is_empty());
        assert_eq!(kinds(&run(schema.clone(), json!(0))), vec![ErrorKind::ExclusiveMinimum]);
        assert_eq!(kinds(&run(schema, json!(10))), vec![ErrorKind::ExclusiveMaximum]);
    }

    #[test]
    fn test_string_constraints() {
        let schema = json!({"type": "string", "pattern": "^[a-z]+$", "minLength": 3, "maxLength": 5});
        assert!(run(schema.clone(), json!("abcd")).is_empty());

        let errors = run(schema.clone(), json!("A"));
        assert_eq!(kinds(&errors), vec![ErrorKind::Pattern, ErrorKind::MinLength]);
        assert_eq!(errors[0].message, "Value does not match pattern: ^[a-z]+$");

        assert_eq!(kinds(&run(schema, json!("abcdef"))), vec![ErrorKind::MaxLength]);
    }

    #[test]
    fn test_unanchored_pattern_matches_partially() {
        assert!(run(json!({"type": "string", "pattern": "b"}), json!("abc")).is_empty());
    }

    #[test]
    fn test_length_counts_characters() {
        let schema = json!({"type": "string", "maxLength": 3});
        assert!(run(schema, json!("日本語")).is_empty());
    }

    #[test]
    fn test_format_only_when_enabled() {
        let schema = json!({"type": "string", "format": "email"});
        assert!(run(schema.clone(), json!("not-an-email")).is_empty());

        let strict = ValidationOptions::new().with_validate_format(true);
        let errors = run_with(schema.clone(), json!("not-an-email"), &strict);
        assert_eq!(kinds(&errors), vec![ErrorKind::Format]);
        assert_eq!(errors[0].message, "Value does not match format: email");
        assert!(run_with(schema, json!("a@b.com"), &strict).is_empty());
    }

    #[test]
    fn test_unknown_format_is_an_error() {
        let strict = ValidationOptions::new().with_validate_format(true);
        let errors = run_with(json!({"type": "string", "format": "phone"}), json!("555"), &strict);
        assert_eq!(kinds(&errors), vec![ErrorKind::UnknownFormat]);
        assert_eq!(errors[0].message, "Unknown format: phone");
    }

    #[test]
    fn test_custom_format_registry() {
        let options = ValidationOptions::new()
            .with_validate_format(true)
            .with_formats(FormatRegistry::new().with_pattern("zip", r"^\d{5}$").unwrap());
        let schema = json!({"type": "string", "format": "zip"});
        assert!(run_with(schema.clone(), json!("12345"), &options).is_empty());
        assert_eq!(kinds(&run_with(schema, json!("1234"), &options)), vec![ErrorKind::Format]);
    }
}
