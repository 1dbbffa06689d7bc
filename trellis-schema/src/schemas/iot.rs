//! IoT policy schema

use crate::schema::{Predicate, Schema};

pub fn iot_policy() -> Schema {
    Schema::new()
        .required("name", Predicate::String)
        .required("policy_document", Predicate::Mapping)
}
