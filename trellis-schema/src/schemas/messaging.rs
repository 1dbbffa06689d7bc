//! Messaging pattern schemas

use super::base;
use crate::schema::{Predicate, Schema};

fn consumers() -> Predicate {
    Predicate::list_of(Predicate::nested(base::function()))
}

pub fn iot_queue_pipe() -> Schema {
    queue_pipe().required("iot_rule", Predicate::nested(base::iot_rule()))
}

pub fn iot_topic_pipe() -> Schema {
    topic_pipe().required("iot_rule", Predicate::nested(base::iot_rule()))
}

pub fn queue_pipe() -> Schema {
    Schema::new()
        .required("queue", Predicate::nested(base::queue()))
        .required("lambda_handlers", consumers())
}

pub fn topic_pipe() -> Schema {
    Schema::new()
        .required("topic", Predicate::nested(base::topic()))
        .required("lambda_handlers", consumers())
}

pub fn iot_function_pipe() -> Schema {
    Schema::new()
        .required("lambda_handler", Predicate::nested(base::function()))
        .required("iot_rule", Predicate::nested(base::iot_rule()))
}

pub fn bucket_function_pipe() -> Schema {
    Schema::new()
        .required("bucket", Predicate::nested(base::bucket()))
        .required("lambda_handler", Predicate::nested(base::function()))
        .required("events", Predicate::list_of(Predicate::String))
}

pub fn scheduled_functions() -> Schema {
    Schema::new()
        .required(
            "cloudwatch_rule",
            Predicate::nested(
                Schema::new()
                    .required("rule_name", Predicate::String)
                    .optional("description", Predicate::String)
                    .required("enabled", Predicate::Boolean)
                    .required("schedule", Predicate::String),
            ),
        )
        .required("lambda_handlers", consumers())
}
