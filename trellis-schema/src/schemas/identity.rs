//! Identity pattern schemas

use super::base;
use crate::schema::{Predicate, Schema};

fn strings() -> Predicate {
    Predicate::list_of(Predicate::String)
}

fn message(with_subject: bool) -> Predicate {
    let schema = if with_subject {
        Schema::new().required("subject", Predicate::String)
    } else {
        Schema::new()
    };
    Predicate::nested(schema.required("body", Predicate::String))
}

fn password_policy() -> Schema {
    Schema::new()
        .optional("minimum_length", Predicate::Integer)
        .optional("temporary_password_duration", Predicate::Integer)
        .optional(
            "require",
            Predicate::nested(
                Schema::new()
                    .optional("lower_case", Predicate::Boolean)
                    .optional("upper_case", Predicate::Boolean)
                    .optional("digits", Predicate::Boolean)
                    .optional("symbols", Predicate::Boolean),
            ),
        )
}

fn sign_up() -> Schema {
    Schema::new().required("enabled", Predicate::Boolean).required(
        "user_verification",
        Predicate::nested(
            Schema::new()
                .optional(
                    "email",
                    Predicate::nested(
                        Schema::new()
                            .required("subject", Predicate::String)
                            .required("body", Predicate::String)
                            .required("style", Predicate::String),
                    ),
                )
                .optional("sms", message(false)),
        ),
    )
}

fn attributes() -> Schema {
    Schema::new()
        .required(
            "standard",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .required("name", Predicate::String)
                    .required("mutable", Predicate::Boolean)
                    .required("required", Predicate::Boolean),
            )),
        )
        .optional(
            "custom",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .required("name", Predicate::String)
                    .required("type", Predicate::String)
                    .optional("mutable", Predicate::Boolean)
                    .optional("minimum_length", Predicate::Integer)
                    .optional("maximum_length", Predicate::Integer),
            )),
        )
}

fn app_client() -> Schema {
    Schema::new()
        .required("enabled", Predicate::Boolean)
        .required("client_name", Predicate::String)
        .required("generate_secret", Predicate::Boolean)
        .optional(
            "auth_flows",
            Predicate::nested(
                Schema::new()
                    .optional("admin_user_password", Predicate::Boolean)
                    .optional("custom", Predicate::Boolean)
                    .optional("refresh_token", Predicate::Boolean)
                    .optional("user_password", Predicate::Boolean)
                    .optional("user_srp", Predicate::Boolean),
            ),
        )
}

/// Trigger names accepted under `user_pool.triggers`
pub const TRIGGERS: [&str; 10] = [
    "create_auth_challenge",
    "custom_message",
    "define_auth_challenge",
    "post_authentication",
    "post_confirmation",
    "pre_authentication",
    "pre_sign_up",
    "pre_token_generation",
    "user_migration",
    "verify_auth_challenge_response",
];

fn triggers() -> Schema {
    TRIGGERS.iter().fold(Schema::new(), |schema, trigger| {
        schema.optional(trigger, Predicate::nested(base::function()))
    })
}

pub fn user_pool() -> Schema {
    Schema::new()
        .required("pool_name", Predicate::String)
        .optional(
            "email",
            Predicate::nested(
                Schema::new()
                    .required("from", Predicate::String)
                    .optional("reply_to", Predicate::String),
            ),
        )
        .required("password_policy", Predicate::nested(password_policy()))
        .required("sign_up", Predicate::nested(sign_up()))
        .required(
            "invitation",
            Predicate::nested(
                Schema::new()
                    .optional("email", message(true))
                    .optional("sms", message(false)),
            ),
        )
        .required(
            "sign_in",
            Predicate::nested(Schema::new().required("order", strings())),
        )
        .required("attributes", Predicate::nested(attributes()))
        .optional("app_client", Predicate::nested(app_client()))
        .optional("triggers", Predicate::nested(triggers()))
}

pub fn user_serverless_backend() -> Schema {
    Schema::new()
        .optional("authorizer_function", Predicate::nested(base::authorizer_function()))
        .optional("buckets", Predicate::list_of(Predicate::nested(base::bucket())))
        .optional("dynamo_tables", Predicate::list_of(Predicate::nested(base::table())))
        .required("user_pool", Predicate::nested(user_pool()))
}

pub fn user_pool_groups() -> Schema {
    Schema::new().required(
        "user_pool_groups",
        Predicate::list_of(Predicate::nested(
            Schema::new()
                .required("group_name", Predicate::String)
                .optional("description", Predicate::String)
                .required("pool_id", Predicate::String)
                .required("precedence", Predicate::Integer)
                .required(
                    "role",
                    Predicate::nested(
                        Schema::new()
                            .required("name", Predicate::String)
                            .required("actions", strings())
                            .required("resources", strings())
                            .required("principal", Predicate::String),
                    ),
                ),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use serde_json::json;

    #[test]
    fn test_group_role_principal_required() {
        let config = json!({
            "user_pool_groups": [{
                "group_name": "admins",
                "pool_id": "us-east-1_abc",
                "precedence": 1,
                "role": { "name": "admins", "actions": ["s3:*"], "resources": ["*"] }
            }]
        });
        let err = validate(&user_pool_groups(), &config).unwrap_err();
        assert_eq!(err.path(), Some("user_pool_groups[0].role.principal"));
    }

    #[test]
    fn test_trigger_functions_validated() {
        let config = json!({
            "pool_name": "users",
            "password_policy": {},
            "sign_up": { "enabled": true, "user_verification": {} },
            "invitation": {},
            "sign_in": { "order": ["email"] },
            "attributes": { "standard": [] },
            "triggers": { "pre_sign_up": { "lambda_name": "screen" } }
        });
        let err = validate(&user_pool(), &config).unwrap_err();
        assert_eq!(err.path(), Some("triggers.pre_sign_up.runtime"));
    }
}
