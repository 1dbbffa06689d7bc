//! Configuration validator
//!
//! Walks a configuration depth-first in schema field order and stops at the
//! first violation. Keys the schema does not mention are ignored. Types are
//! strict: `"5"` is not an integer and `null` never satisfies anything but
//! [`Predicate::Any`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::schema::{Predicate, Schema};

/// Path rendered for the configuration root
const ROOT: &str = "<root>";

/// Validates a configuration against a schema
///
/// # Arguments
/// * `schema` - The schema to check against
/// * `configuration` - The configuration mapping
///
/// # Errors
/// Returns the first `MissingField` or `TypeMismatch` found
///
/// # Example
/// ```
/// use serde_json::json;
/// use trellis_schema::{Predicate, Schema, validate};
///
/// let schema = Schema::new().required("queue_name", Predicate::String);
/// assert!(validate(&schema, &json!({ "queue_name": "orders" })).is_ok());
/// assert!(validate(&schema, &json!({})).is_err());
/// ```
pub fn validate(schema: &Schema, configuration: &Value) -> Result<(), ConfigurationError> {
    check_schema(schema, configuration, "")
}

/// Reads a validated sub-mapping into its typed form
///
/// # Arguments
/// * `value` - The value to read
/// * `path` - Path of `value`, used in the error
///
/// # Errors
/// Returns `Malformed` when the value does not fit `T`
pub fn extract<T: DeserializeOwned>(value: &Value, path: &str) -> Result<T, ConfigurationError> {
    T::deserialize(value).map_err(|e| ConfigurationError::Malformed {
        path: display_path(path),
        message: e.to_string(),
    })
}

fn check_schema(schema: &Schema, value: &Value, path: &str) -> Result<(), ConfigurationError> {
    let Value::Object(map) = value else {
        return Err(mismatch(path, "a mapping", value));
    };

    for field in schema.fields() {
        let field_path = join(path, &field.key);
        match map.get(&field.key) {
            Some(child) => check_predicate(&field.predicate, child, &field_path)?,
            None if field.required => {
                return Err(ConfigurationError::MissingField { path: field_path });
            }
            None => {}
        }
    }

    Ok(())
}

fn check_predicate(predicate: &Predicate, value: &Value, path: &str) -> Result<(), ConfigurationError> {
    let ok = match predicate {
        Predicate::String => value.is_string(),
        Predicate::Integer => value.is_i64() || value.is_u64(),
        Predicate::Boolean => value.is_boolean(),
        Predicate::Mapping => value.is_object(),
        Predicate::Any => true,
        Predicate::StringMap => {
            let Value::Object(map) = value else {
                return Err(mismatch(path, predicate.expected(), value));
            };
            for (key, entry) in map {
                if !entry.is_string() {
                    return Err(mismatch(&join(path, key), "a string", entry));
                }
            }
            true
        }
        Predicate::ListOf(item) => {
            let Value::Array(items) = value else {
                return Err(mismatch(path, predicate.expected(), value));
            };
            for (index, entry) in items.iter().enumerate() {
                check_predicate(item, entry, &format!("{}[{}]", path, index))?;
            }
            true
        }
        Predicate::Nested(schema) => return check_schema(schema, value, path),
    };

    if ok {
        Ok(())
    } else {
        Err(mismatch(path, predicate.expected(), value))
    }
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> ConfigurationError {
    ConfigurationError::TypeMismatch {
        path: display_path(path),
        expected,
        found: kind_of(found),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        ROOT.to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn function_schema() -> Schema {
        Schema::new()
            .required("lambda_name", Predicate::String)
            .required("runtime", Predicate::String)
            .optional("timeout", Predicate::Integer)
            .optional("environment_vars", Predicate::StringMap)
            .required("iam_actions", Predicate::list_of(Predicate::String))
    }

    fn pipe_schema() -> Schema {
        Schema::new()
            .required(
                "queue",
                Predicate::nested(Schema::new().required("queue_name", Predicate::String)),
            )
            .required("lambda_handlers", Predicate::list_of(Predicate::nested(function_schema())))
    }

    fn function() -> Value {
        json!({
            "lambda_name": "process",
            "runtime": "PYTHON_3_8",
            "iam_actions": ["sqs:SendMessage"]
        })
    }

    #[test]
    fn test_valid_configuration() {
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [function()]
        });
        assert!(validate(&pipe_schema(), &config).is_ok());
    }

    #[test]
    fn test_missing_nested_field_reports_path() {
        let config = json!({
            "queue": {},
            "lambda_handlers": []
        });
        let err = validate(&pipe_schema(), &config).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingField {
                path: "queue.queue_name".to_string()
            }
        );
    }

    #[test]
    fn test_list_item_mismatch_reports_index() {
        let mut bad = function();
        bad["runtime"] = json!(38);
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [function(), bad]
        });

        let err = validate(&pipe_schema(), &config).unwrap_err();
        assert_eq!(err.path(), Some("lambda_handlers[1].runtime"));
        assert!(err.to_string().contains("must be a string, found an integer"));
    }

    #[test]
    fn test_extra_keys_tolerated() {
        let mut config = function();
        config["unexpected"] = json!({ "anything": [1, 2, 3] });
        assert!(validate(&function_schema(), &config).is_ok());
    }

    #[test]
    fn test_optional_absent_is_fine_but_present_is_checked() {
        let mut config = function();
        assert!(validate(&function_schema(), &config).is_ok());

        config["timeout"] = json!("30");
        let err = validate(&function_schema(), &config).unwrap_err();
        assert_eq!(err.path(), Some("timeout"));

        config["timeout"] = json!(2.5);
        let err = validate(&function_schema(), &config).unwrap_err();
        assert!(err.to_string().contains("found a float"));
    }

    #[test]
    fn test_null_is_not_absent() {
        let mut config = function();
        config["timeout"] = Value::Null;
        let err = validate(&function_schema(), &config).unwrap_err();
        assert!(err.to_string().contains("found null"));
    }

    #[test]
    fn test_string_map_values_checked() {
        let mut config = function();
        config["environment_vars"] = json!({ "STAGE": "dev", "RETRIES": 3 });
        let err = validate(&function_schema(), &config).unwrap_err();
        assert_eq!(err.path(), Some("environment_vars.RETRIES"));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let err = validate(&function_schema(), &json!([1, 2])).unwrap_err();
        assert_eq!(err.path(), Some("<root>"));
    }

    #[test]
    fn test_first_violation_wins() {
        let err = validate(&function_schema(), &json!({})).unwrap_err();
        assert_eq!(err.path(), Some("lambda_name"));
    }

    #[test]
    fn test_extract_typed_value() {
        #[derive(Deserialize)]
        struct Queue {
            queue_name: String,
        }

        let queue: Queue = extract(&json!({ "queue_name": "orders" }), "queue").unwrap();
        assert_eq!(queue.queue_name, "orders");

        let err = extract::<Queue>(&json!({}), "queue").err().unwrap();
        assert!(matches!(err, ConfigurationError::Malformed { ref path, .. } if path == "queue"));
    }
}
