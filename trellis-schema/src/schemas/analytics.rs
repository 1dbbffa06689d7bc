//! Analytics pattern schemas

use super::base;
use crate::schema::{Predicate, Schema};

fn datasets() -> Predicate {
    Predicate::list_of(Predicate::nested(base::dataset()))
}

/// Single channel, pipeline and datastore sharing one name
pub fn workflow() -> Schema {
    Schema::new()
        .required("name", Predicate::String)
        .optional(
            "retention_periods",
            Predicate::nested(
                Schema::new()
                    .optional("channel", Predicate::Integer)
                    .optional("datastore", Predicate::Integer),
            ),
        )
        .optional("extra_activities", Predicate::list_of(Predicate::Any))
        .optional("datasets", datasets())
}

pub fn fan_in() -> Schema {
    Schema::new()
        .required(
            "channel_pipe_definition",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .optional("extra_activities", Predicate::list_of(Predicate::Any))
                    .required("name", Predicate::String)
                    .optional("channel_retention_period", Predicate::Integer),
            )),
        )
        .required(
            "datastore_definition",
            Predicate::nested(
                Schema::new()
                    .required("name", Predicate::String)
                    .optional("datastore_retention_period", Predicate::Integer),
            ),
        )
        .optional("datasets", datasets())
}

pub fn fan_out() -> Schema {
    Schema::new()
        .required(
            "channel_definition",
            Predicate::nested(
                Schema::new()
                    .required("name", Predicate::String)
                    .optional("channel_retention_period", Predicate::Integer),
            ),
        )
        .required(
            "datastore_pipe_definition",
            Predicate::list_of(Predicate::nested(
                Schema::new()
                    .optional("extra_activities", Predicate::list_of(Predicate::Any))
                    .required("name", Predicate::String)
                    .optional("datastore_retention_period", Predicate::Integer),
            )),
        )
        .optional("datasets", datasets())
}
