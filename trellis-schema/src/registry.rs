//! Schema registry
//!
//! Maps every supported pattern to its configuration schema. The standard
//! registry is built once per process and never mutated afterwards.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::schema::Schema;
use crate::schemas;
use crate::validator::validate;

/// Every pattern Trellis can compose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    IotQueuePipe,
    IotTopicPipe,
    QueuePipe,
    TopicPipe,
    IotFunctionPipe,
    BucketFunctionPipe,
    ScheduledFunctions,
    IotPolicy,
    AnalyticsWorkflow,
    AnalyticsFanIn,
    AnalyticsFanOut,
    RestApiService,
    UserServerlessBackend,
    UserPoolGroups,
    FunctionsCluster,
    BucketsCluster,
}

impl PatternKind {
    pub const ALL: [PatternKind; 16] = [
        PatternKind::IotQueuePipe,
        PatternKind::IotTopicPipe,
        PatternKind::QueuePipe,
        PatternKind::TopicPipe,
        PatternKind::IotFunctionPipe,
        PatternKind::BucketFunctionPipe,
        PatternKind::ScheduledFunctions,
        PatternKind::IotPolicy,
        PatternKind::AnalyticsWorkflow,
        PatternKind::AnalyticsFanIn,
        PatternKind::AnalyticsFanOut,
        PatternKind::RestApiService,
        PatternKind::UserServerlessBackend,
        PatternKind::UserPoolGroups,
        PatternKind::FunctionsCluster,
        PatternKind::BucketsCluster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::IotQueuePipe => "iot_queue_pipe",
            PatternKind::IotTopicPipe => "iot_topic_pipe",
            PatternKind::QueuePipe => "queue_pipe",
            PatternKind::TopicPipe => "topic_pipe",
            PatternKind::IotFunctionPipe => "iot_function_pipe",
            PatternKind::BucketFunctionPipe => "bucket_function_pipe",
            PatternKind::ScheduledFunctions => "scheduled_functions",
            PatternKind::IotPolicy => "iot_policy",
            PatternKind::AnalyticsWorkflow => "analytics_workflow",
            PatternKind::AnalyticsFanIn => "analytics_fan_in",
            PatternKind::AnalyticsFanOut => "analytics_fan_out",
            PatternKind::RestApiService => "rest_api_service",
            PatternKind::UserServerlessBackend => "user_serverless_backend",
            PatternKind::UserPoolGroups => "user_pool_groups",
            PatternKind::FunctionsCluster => "functions_cluster",
            PatternKind::BucketsCluster => "buckets_cluster",
        }
    }

    fn schema(&self) -> Schema {
        match self {
            PatternKind::IotQueuePipe => schemas::messaging::iot_queue_pipe(),
            PatternKind::IotTopicPipe => schemas::messaging::iot_topic_pipe(),
            PatternKind::QueuePipe => schemas::messaging::queue_pipe(),
            PatternKind::TopicPipe => schemas::messaging::topic_pipe(),
            PatternKind::IotFunctionPipe => schemas::messaging::iot_function_pipe(),
            PatternKind::BucketFunctionPipe => schemas::messaging::bucket_function_pipe(),
            PatternKind::ScheduledFunctions => schemas::messaging::scheduled_functions(),
            PatternKind::IotPolicy => schemas::iot::iot_policy(),
            PatternKind::AnalyticsWorkflow => schemas::analytics::workflow(),
            PatternKind::AnalyticsFanIn => schemas::analytics::fan_in(),
            PatternKind::AnalyticsFanOut => schemas::analytics::fan_out(),
            PatternKind::RestApiService => schemas::api::rest_api_service(),
            PatternKind::UserServerlessBackend => schemas::identity::user_serverless_backend(),
            PatternKind::UserPoolGroups => schemas::identity::user_pool_groups(),
            PatternKind::FunctionsCluster => schemas::clusters::functions_cluster(),
            PatternKind::BucketsCluster => schemas::clusters::buckets_cluster(),
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of pattern schemas
pub struct SchemaRegistry {
    schemas: Vec<(PatternKind, Schema)>,
}

impl SchemaRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            schemas: Vec::new(),
        }
    }

    /// Creates a registry holding the schema of every [`PatternKind`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for kind in PatternKind::ALL {
            registry.register(kind, kind.schema());
        }
        registry
    }

    /// Registers a schema
    ///
    /// # Panics
    /// Panics if a schema for the same pattern is already registered
    pub fn register(&mut self, kind: PatternKind, schema: Schema) {
        if self.schemas.iter().any(|(k, _)| *k == kind) {
            panic!("Schema for pattern '{}' is already registered", kind);
        }
        tracing::trace!(pattern = %kind, fields = schema.fields().len(), "Registered schema");
        self.schemas.push((kind, schema));
    }

    /// Gets the schema of a pattern
    pub fn get(&self, kind: PatternKind) -> Option<&Schema> {
        self.schemas
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, schema)| schema)
    }

    /// Patterns with a registered schema
    pub fn kinds(&self) -> impl Iterator<Item = PatternKind> + '_ {
        self.schemas.iter().map(|(kind, _)| *kind)
    }

    /// Validates a configuration against the schema of `kind`
    ///
    /// # Errors
    /// Returns `UnknownPattern` when nothing is registered for `kind`,
    /// otherwise whatever [`validate`] reports
    pub fn validate(&self, kind: PatternKind, configuration: &Value) -> Result<(), ConfigurationError> {
        let schema = self
            .get(kind)
            .ok_or_else(|| ConfigurationError::UnknownPattern(kind.to_string()))?;
        validate(schema, configuration)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static STANDARD: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::standard);

/// Process-wide registry with every standard schema
pub fn standard_registry() -> &'static SchemaRegistry {
    &STANDARD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Predicate;
    use serde_json::json;

    #[test]
    fn test_standard_registry_covers_every_pattern() {
        let registry = standard_registry();
        for kind in PatternKind::ALL {
            assert!(registry.get(kind).is_some(), "missing schema for {}", kind);
        }
        assert_eq!(registry.kinds().count(), PatternKind::ALL.len());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_registration() {
        let mut registry = SchemaRegistry::new();
        registry.register(PatternKind::QueuePipe, Schema::new());
        registry.register(PatternKind::QueuePipe, Schema::new());
    }

    #[test]
    fn test_validate_unknown_pattern() {
        let registry = SchemaRegistry::new();
        let err = registry
            .validate(PatternKind::TopicPipe, &json!({}))
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownPattern("topic_pipe".to_string()));
    }

    #[test]
    fn test_validate_through_registry() {
        let mut registry = SchemaRegistry::new();
        registry.register(
            PatternKind::BucketsCluster,
            Schema::new().required("buckets", Predicate::list_of(Predicate::Mapping)),
        );

        assert!(registry.validate(PatternKind::BucketsCluster, &json!({ "buckets": [] })).is_ok());
        assert!(registry.validate(PatternKind::BucketsCluster, &json!({})).is_err());
    }
}
