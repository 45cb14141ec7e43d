//! Validator boundary.

use serde_json::Value;

use crate::{
    error::{FormError, Result},
    path::parse_pointer,
    state::errors::ValidationError,
};

/// Turns a schema and a data value into a flat list of errors.
///
/// Message wording is up to the implementation. `Err` is reserved for a
/// schema the validator cannot compile.
pub trait Validator {
    fn validate(&self, schema: &Value, data: &Value) -> Result<Vec<ValidationError>>;
}

impl<F> Validator for F
where
    F: Fn(&Value, &Value) -> Vec<ValidationError>,
{
    fn validate(&self, schema: &Value, data: &Value) -> Result<Vec<ValidationError>> {
        Ok(self(schema, data))
    }
}

/// [`Validator`] backed by the `jsonschema` crate.
///
/// Schemas declaring `$schema` are validated with that draft; others with
/// draft 7, the dialect `definitions` and `dependencies` come from.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl Validator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, data: &Value) -> Result<Vec<ValidationError>> {
        let compiled = if schema.get("$schema").is_some() {
            jsonschema::validator_for(schema)
        } else {
            jsonschema::draft7::new(schema)
        }
        .map_err(|e| FormError::Validator(e.to_string()))?;

        let errors = compiled
            .iter_errors(data)
            .map(|e| ValidationError {
                location: parse_pointer(&e.instance_path.to_string()),
                message: e.to_string(),
            })
            .collect();
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSegment;
    use serde_json::json;

    #[test]
    fn test_locations() {
        let schema = json!({
            "type": "object",
            "properties": {
                "list": {"type": "array", "items": {"type": "string", "minLength": 3}}
            }
        });
        let errors = JsonSchemaValidator
            .validate(&schema, &json!({"list": ["long", "x"]}))
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].location,
            vec![PathSegment::from("list"), PathSegment::from(1)]
        );
        assert!(!errors[0].message.is_empty());
    }

    #[test]
    fn test_root_error() {
        let errors = JsonSchemaValidator
            .validate(&json!({"type": "object", "required": ["a"]}), &json!({}))
            .unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].location.is_empty());
    }

    #[test]
    fn test_bad_schema() {
        let result = JsonSchemaValidator.validate(&json!({"type": 12}), &json!(null));
        assert!(matches!(result, Err(FormError::Validator(_))));
    }

    #[test]
    fn test_closure() {
        let custom = |_: &Value, data: &Value| {
            if data.is_null() {
                vec![ValidationError::new(["x"], "missing")]
            } else {
                Vec::new()
            }
        };
        assert_eq!(custom.validate(&json!({}), &Value::Null).unwrap().len(), 1);
        assert!(custom.validate(&json!({}), &json!(1)).unwrap().is_empty());
    }
}
