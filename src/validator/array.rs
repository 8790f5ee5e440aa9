//! Array constraints

use serde_json::Value;

use super::{child_index, json_equal, Walk};
use crate::error::Result;
use crate::report::{ErrorKind, ValidationError};
use crate::schema::{AdditionalItems, Items, Schema};

impl<'a> Walk<'a> {
    pub(super) fn check_array(
        &mut self,
        schema: &'a Schema,
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let Some(elements) = value.as_array() else {
            return self.type_mismatch(errors, "an array", schema, value, path);
        };

        if let Some(min) = schema.min_items {
            if elements.len() < min {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MinItems,
                        format!("Array has fewer items than the minimum: {}", min),
                    )
                    .with_context("minItems", min),
                    schema,
                    value,
                )?;
            }
        }
        if let Some(max) = schema.max_items {
            if elements.len() > max {
                self.report(
                    errors,
                    ValidationError::new(
                        path,
                        ErrorKind::MaxItems,
                        format!("Array has more items than the maximum: {}", max),
                    )
                    .with_context("maxItems", max),
                    schema,
                    value,
                )?;
            }
        }

        if schema.unique_items {
            if let Some((first, second)) = first_duplicate(elements) {
                self.report(
                    errors,
                    ValidationError::new(path, ErrorKind::UniqueItems, "Array items are not unique")
                        .with_context("first", first)
                        .with_context("second", second),
                    schema,
                    value,
                )?;
            }
        }

        match &schema.items {
            Some(Items::Single(item)) => {
                for (i, element) in elements.iter().enumerate() {
                    self.child(item, element, &child_index(path, i), errors)?;
                }
            }
            Some(Items::Tuple(tuple)) => {
                for (i, element) in elements.iter().enumerate() {
                    match tuple.get(i) {
                        Some(item) => self.child(item, element, &child_index(path, i), errors)?,
                        None => self.additional_item(schema, i, element, path, errors)?,
                    }
                }
            }
            // Without `items`, an explicit `additionalItems` governs every element
            None if schema.additional_items.is_some() => {
                for (i, element) in elements.iter().enumerate() {
                    self.additional_item(schema, i, element, path, errors)?;
                }
            }
            None => {}
        }

        Ok(())
    }

    fn additional_item(
        &mut self,
        schema: &'a Schema,
        index: usize,
        element: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        let here = child_index(path, index);
        match &schema.additional_items {
            Some(AdditionalItems::Schema(extra)) => self.child(extra, element, &here, errors),
            Some(AdditionalItems::AnyOf(candidates)) => {
                for candidate in candidates {
                    if self.descend(&here, |walk| walk.matches(candidate, element, &here))? {
                        return Ok(());
                    }
                }
                self.report(
                    errors,
                    ValidationError::new(
                        here,
                        ErrorKind::ItemNotValid,
                        "Array item does not match any of the additional item schemas",
                    )
                    .with_context("index", index),
                    schema,
                    element,
                )
            }
            Some(AdditionalItems::Allowed(true)) => Ok(()),
            Some(AdditionalItems::Allowed(false)) => self.extra_item(schema, index, element, here, errors),
            None if self.options.additional_items => Ok(()),
            None => self.extra_item(schema, index, element, here, errors),
        }
    }

    fn extra_item(
        &self,
        schema: &Schema,
        index: usize,
        element: &Value,
        here: String,
        errors: &mut Vec<ValidationError>,
    ) -> Result<()> {
        self.report(
            errors,
            ValidationError::new(
                here,
                ErrorKind::AdditionalItems,
                format!("Array index outside tuple length: {}", index),
            )
            .with_context("index", index),
            schema,
            element,
        )
    }
}

/// Indices of the first pair of structurally equal elements
fn first_duplicate(elements: &[Value]) -> Option<(usize, usize)> {
    elements.iter().enumerate().find_map(|(i, a)| {
        elements[i + 1..]
            .iter()
            .position(|b| json_equal(a, b))
            .map(|offset| (i, i + 1 + offset))
    })
}

#[cfg(test)]
mod tests {
    use super::first_duplicate;
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
    fn test_first_duplicate() {
        assert_eq!(first_duplicate(&[json!(1), json!(2), json!(3)]), None);
        assert_eq!(first_duplicate(&[json!(1), json!(2), json!(2), json!(1)]), Some((0, 3)));
        assert_eq!(
            first_duplicate(&[json!({"a": 1, "b": 2}), json!({"b": 2, "a": 1})]),
            Some((0, 1))
        );
    }

    #[test]
    fn test_array_type() {
        assert_eq!(kinds(&run(json!({"type": "array"}), json!({}))), vec![ErrorKind::Type]);
        assert!(run(json!({"type": "array"}), json!([])).is_empty());
    }

    #[test]
    fn test_length_bounds() {
        let schema = json!({"type": "array", "minItems": 2, "maxItems": 3});
        assert!(run(schema.clone(), json!([1, 2])).is_empty());
        assert_eq!(kinds(&run(schema.clone(), json!([1]))), vec![ErrorKind::MinItems]);
        assert_eq!(kinds(&run(schema, json!([1, 2, 3, 4]))), vec![ErrorKind::MaxItems]);
    }

    #[test]
    fn test_unique_items_reported_once() {
        let schema = json!({"type": "array", "uniqueItems": true});
        assert!(run(schema.clone(), json!([1, "1", [1], {"a": 1}])).is_empty());
        let errors = run(schema, json!([1, 1, 2, 2]));
        assert_eq!(kinds(&errors), vec![ErrorKind::UniqueItems]);
        assert_eq!(errors[0].message, "Array items are not unique");
    }

    #[test]
    fn test_single_items_schema() {
        let errors = run(json!({"items": {"type": "number"}}), json!([1, "a", 3, true]));
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["[1]", "[3]"]);
    }

    #[test]
    fn test_single_items_ignores_additional_items_option() {
        let options = ValidationOptions::new().with_additional_items(false);
        assert!(run_with(json!({"items": {"type": "number"}}), json!([1, 2, 3]), &options).is_empty());
    }

    #[test]
    fn test_tuple_with_additional_items_false() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "number"}, {"type": "string"}],
            "additionalItems": false
        });
        let errors = run(schema, json!([1, "a", true]));
        assert_eq!(kinds(&errors), vec![ErrorKind::AdditionalItems]);
        assert_eq!(errors[0].path, "[2]");
        assert_eq!(errors[0].message, "Array index outside tuple length: 2");
    }

    #[test]
    fn test_tuple_additional_items_policy() {
        let tuple = json!({"items": [{"type": "number"}]});
        assert!(run(tuple.clone(), json!([1, "x", null])).is_empty());

        let strict = ValidationOptions::new().with_additional_items(false);
        assert_eq!(
            kinds(&run_with(tuple, json!([1, "x", null]), &strict)),
            vec![ErrorKind::AdditionalItems, ErrorKind::AdditionalItems]
        );

        // the schema overrides the option
        let open = json!({"items": [{"type": "number"}], "additionalItems": true});
        assert!(run_with(open, json!([1, "x"]), &strict).is_empty());
    }

    #[test]
    fn test_tuple_additional_items_schema() {
        let schema = json!({"items": [{"type": "number"}], "additionalItems": {"type": "string"}});
        assert!(run(schema.clone(), json!([1, "a", "b"])).is_empty());
        let errors = run(schema, json!([1, "a", 2]));
        assert_eq!(kinds(&errors), vec![ErrorKind::Type]);
        assert_eq!(errors[0].path, "[2]");
    }

    #[test]
    fn test_additional_items_as_alternatives() {
        let schema = json!({
            "items": [{"type": "number"}],
            "additionalItems": [{"type": "string"}, {"type": "boolean"}]
        });
        assert!(run(schema.clone(), json!([1, "a", true])).is_empty());
        let errors = run(schema, json!([1, "a", null]));
        assert_eq!(kinds(&errors), vec![ErrorKind::ItemNotValid]);
        assert_eq!(errors[0].path, "[2]");
    }

    #[test]
    fn test_additional_items_without_items() {
        let schema = json!({"type": "array", "additionalItems": {"type": "number"}});
        let errors = run(schema, json!([1, "a"]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "[1]");

        let closed = json!({"type": "array", "additionalItems": false});
        assert_eq!(kinds(&run(closed.clone(), json!([1]))), vec![ErrorKind::AdditionalItems]);
        assert!(run(closed, json!([])).is_empty());
    }

    #[test]
    fn test_nested_paths() {
        let schema = json!({"items": {"items": {"type": "string"}}});
        let errors = run(schema, json!([["a"], ["b", 3]]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "[1][1]");
    }
}
