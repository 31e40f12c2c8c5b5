//! Validate tool call arguments against a tool's JSON Schema before execution.

use serde_json::Value;

use crate::error::ParleyError;

/// Check `args` against the subset of JSON Schema tools declare: the
/// top-level `type`, `required` keys, and each property's `type` and `enum`.
///
/// Returns the first violation as [`ParleyError::InvalidArgument`].
pub fn validate_arguments(tool_name: &str, args: &Value, schema: &Value) -> Result<(), ParleyError> {
    let violation = |detail: String| {
        ParleyError::InvalidArgument(format!("invalid arguments for '{tool_name}': {detail}"))
    };

    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(violation(format!(
            "expected object, got {}",
            json_type_name(args)
        )));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    for name in schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        if !obj.contains_key(name) {
            return Err(violation(format!("missing required field '{name}'")));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in obj {
        let Some(prop) = properties.get(key) else {
            continue;
        };
        if let Some(expected) = prop.get("type").and_then(Value::as_str) {
            if !value_matches_type(value, expected) {
                return Err(violation(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                )));
            }
        }
        if let Some(allowed) = prop.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                return Err(violation(format!("field '{key}' is not one of {}", Value::Array(allowed.clone()))));
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
