//! Shared schema fragments

use crate::schema::{Predicate, Schema};

fn strings() -> Predicate {
    Predicate::list_of(Predicate::String)
}

/// Alarm entries are only checked for shape at attachment time
pub fn alarms() -> Predicate {
    Predicate::list_of(Predicate::Mapping)
}

/// A function definition
pub fn function() -> Schema {
    Schema::new()
        .required("lambda_name", Predicate::String)
        .optional("description", Predicate::String)
        .optional("code_path", Predicate::String)
        .required("runtime", Predicate::String)
        .required("handler", Predicate::String)
        .optional("layers", strings())
        .optional("timeout", Predicate::Integer)
        .optional("reserved_concurrent_executions", Predicate::Integer)
        .optional("environment_vars", Predicate::StringMap)
        .required("iam_actions", strings())
        .optional("alarms", alarms())
        .optional(
            "keep_warm",
            Predicate::nested(
                Schema::new()
                    .required("enabled", Predicate::Boolean)
                    .optional("rate", Predicate::String),
            ),
        )
}

/// A function built from scratch (`origin`) or referenced by ARN (`imported`)
pub fn authorizer_function() -> Schema {
    Schema::new()
        .optional("origin", Predicate::nested(function()))
        .optional(
            "imported",
            Predicate::nested(
                Schema::new()
                    .required("arn", Predicate::String)
                    .required("identifier", Predicate::String),
            ),
        )
}

/// An IoT topic rule
pub fn iot_rule() -> Schema {
    Schema::new()
        .required("rule_name", Predicate::String)
        .optional("description", Predicate::String)
        .required("rule_disabled", Predicate::Boolean)
        .required("sql", Predicate::String)
        .required("aws_iot_sql_version", Predicate::String)
}

pub fn queue() -> Schema {
    Schema::new()
        .required("queue_name", Predicate::String)
        .optional("queue_delivery_delay", Predicate::Integer)
        .optional("queue_message_visibility", Predicate::Integer)
        .optional("alarms", alarms())
}

pub fn topic() -> Schema {
    Schema::new()
        .required("topic_name", Predicate::String)
        .optional("alarms", alarms())
}

pub fn bucket() -> Schema {
    Schema::new()
        .required("bucket_name", Predicate::String)
        .optional(
            "cors",
            Predicate::nested(
                Schema::new()
                    .required("allowed_methods", strings())
                    .required("allowed_origins", strings()),
            ),
        )
        .required("versioned", Predicate::Boolean)
        .required("public_read_access", Predicate::Boolean)
        .optional(
            "website",
            Predicate::nested(
                Schema::new()
                    .required("index", Predicate::String)
                    .required("error", Predicate::String),
            ),
        )
}

fn key_attribute() -> Predicate {
    Predicate::nested(
        Schema::new()
            .required("name", Predicate::String)
            .required("type", Predicate::String),
    )
}

pub fn table() -> Schema {
    Schema::new()
        .required("table_name", Predicate::String)
        .required("partition_key", Predicate::String)
        .optional("sort_key", key_attribute())
        .optional(
            "stream",
            Predicate::nested(
                Schema::new()
                    .required("enabled", Predicate::Boolean)
                    .optional("function", Predicate::nested(function())),
            ),
        )
        .optional("ttl_attribute", Predicate::String)
        .optional("billing_mode", Predicate::String)
        .optional("read_capacity", Predicate::Integer)
        .optional("write_capacity", Predicate::Integer)
        .optional(
            "global_secondary_indexes",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .required("index_name", Predicate::String)
                    .required("partition_key", Predicate::String)
                    .optional("sort_key", key_attribute())
                    .optional("read_capacity", Predicate::Integer)
                    .optional("write_capacity", Predicate::Integer),
            )),
        )
        .optional(
            "local_secondary_indexes",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .required("index_name", Predicate::String)
                    .required("sort_key", key_attribute()),
            )),
        )
        .optional("alarms", alarms())
}

/// An analytics SQL dataset
pub fn dataset() -> Schema {
    Schema::new()
        .required("dataset_name", Predicate::String)
        .optional("retention_period", Predicate::Integer)
        .required(
            "sql_action",
            Predicate::nested(
                Schema::new()
                    .required("sql_query", Predicate::String)
                    .optional(
                        "delta_time",
                        Predicate::nested(
                            Schema::new()
                                .required("timestamp_field", Predicate::String)
                                .required("offset_seconds", Predicate::Integer),
                        ),
                    ),
            ),
        )
        .optional(
            "trigger_action",
            Predicate::nested(Schema::new().required("schedule", Predicate::String)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use serde_json::json;

    #[test]
    fn test_function_with_keep_warm() {
        let config = json!({
            "lambda_name": "process",
            "runtime": "PYTHON_3_8",
            "handler": "app.handler",
            "iam_actions": ["dynamodb:PutItem"],
            "keep_warm": { "enabled": true }
        });
        assert!(validate(&function(), &config).is_ok());
    }

    #[test]
    fn test_function_requires_iam_actions() {
        let config = json!({
            "lambda_name": "process",
            "runtime": "PYTHON_3_8",
            "handler": "app.handler"
        });
        let err = validate(&function(), &config).unwrap_err();
        assert_eq!(err.path(), Some("iam_actions"));
    }

    #[test]
    fn test_alarms_only_checked_as_mappings() {
        let config = json!({
            "queue_name": "orders",
            "alarms": [{ "name": "ApproximateNumberOfMessagesVisible" }]
        });
        assert!(validate(&queue(), &config).is_ok());

        let config = json!({ "queue_name": "orders", "alarms": ["oops"] });
        assert_eq!(validate(&queue(), &config).unwrap_err().path(), Some("alarms[0]"));
    }

    #[test]
    fn test_table_index_sort_key_shape() {
        let config = json!({
            "table_name": "users",
            "partition_key": "id",
            "local_secondary_indexes": [{ "index_name": "by_date", "sort_key": { "name": "created" } }]
        });
        let err = validate(&table(), &config).unwrap_err();
        assert_eq!(err.path(), Some("local_secondary_indexes[0].sort_key.type"));
    }
}
