//! Validation of generated parameters against a declared input schema.
//!
//! Supports the JSON-schema subset downstream actions declare: an `object`
//! root with `properties`, `required`, and primitive `type` annotations,
//! recursing into nested objects. Unknown fields pass through untouched;
//! only declared constraints are checked.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

/// Validate `parameters` against `schema`. Empty result means valid.
pub fn validate_parameters(parameters: &Value, schema: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !parameters.is_object() {
        errors.push(ValidationError {
            field: "(root)".to_string(),
            message: "generated parameters must be a JSON object".to_string(),
            expected: Some("object".to_string()),
            actual: Some(value_type(parameters).to_string()),
        });
        return errors;
    }

    // A null or empty schema declares no constraints.
    if schema.is_null() || schema.as_object().map(|o| o.is_empty()).unwrap_or(false) {
        return errors;
    }

    validate_object(parameters, schema, "", &mut errors);
    errors
}

fn validate_object(value: &Value, schema: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if value.get(field).map(|v| !v.is_null()).unwrap_or(false) {
                continue;
            }
            errors.push(ValidationError {
                field: join_path(path, field),
                message: format!("required field '{}' is missing", field),
                expected: Some("present".to_string()),
                actual: Some("missing".to_string()),
            });
        }
    }

    let Some(properties) = properties else {
        return;
    };

    for (field, field_schema) in properties {
        let Some(field_value) = value.get(field) else {
            continue;
        };
        if field_value.is_null() {
            continue;
        }

        let field_path = join_path(path, field);
        if let Some(expected) = field_schema.get("type").and_then(Value::as_str) {
            if !type_matches(field_value, expected) {
                errors.push(ValidationError {
                    field: field_path.clone(),
                    message: format!(
                        "field '{}' has wrong type: expected {}, got {}",
                        field,
                        expected,
                        value_type(field_value)
                    ),
                    expected: Some(expected.to_string()),
                    actual: Some(value_type(field_value).to_string()),
                });
                continue;
            }

            if expected == "object" {
                validate_object(field_value, field_schema, &field_path, errors);
            }
        }
    }
}

fn join_path(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        // Unknown type annotations are not enforced.
        _ => true,
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
