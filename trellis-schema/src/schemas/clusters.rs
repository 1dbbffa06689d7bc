//! Cluster pattern schemas

use super::base;
use crate::schema::{Predicate, Schema};

pub fn functions_cluster() -> Schema {
    Schema::new().required("functions", Predicate::list_of(Predicate::nested(base::function())))
}

pub fn buckets_cluster() -> Schema {
    Schema::new().required("buckets", Predicate::list_of(Predicate::nested(base::bucket())))
}
