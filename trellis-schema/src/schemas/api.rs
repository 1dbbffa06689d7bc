//! REST API pattern schema

use super::base;
use crate::schema::{Predicate, Schema};

fn strings() -> Predicate {
    Predicate::list_of(Predicate::String)
}

fn settings() -> Schema {
    Schema::new()
        .required("proxy", Predicate::Boolean)
        .optional(
            "custom_domain",
            Predicate::nested(
                Schema::new()
                    .required("domain_name", Predicate::String)
                    .required("certificate_arn", Predicate::String),
            ),
        )
        .optional(
            "default_cors_options",
            Predicate::nested(
                Schema::new()
                    .required("allow_origins", strings())
                    .required("options_status_code", Predicate::Integer),
            ),
        )
        .optional("default_http_methods", strings())
        .required("default_handler", Predicate::nested(base::function()))
        .optional("default_media_types", strings())
        .optional(
            "default_stage_options",
            Predicate::nested(
                Schema::new()
                    .required("metrics_enabled", Predicate::Boolean)
                    .required("logging_level", Predicate::String),
            ),
        )
}

fn resource() -> Schema {
    Schema::new()
        .required("resource_name", Predicate::String)
        .optional("methods", strings())
        .optional("handler", Predicate::nested(base::function()))
}

pub fn rest_api_service() -> Schema {
    Schema::new()
        .optional("buckets", Predicate::list_of(Predicate::nested(base::bucket())))
        .optional("functions", Predicate::list_of(Predicate::nested(base::function())))
        .required(
            "api",
            Predicate::nested(
                Schema::new()
                    .required("apigateway_name", Predicate::String)
                    .optional("apigateway_description", Predicate::String)
                    .optional(
                        "authorizer_function",
                        Predicate::nested(base::authorizer_function()),
                    )
                    .required("settings", Predicate::nested(settings()))
                    .optional("resource", Predicate::nested(resource())),
            ),
        )
}
