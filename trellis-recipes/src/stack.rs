//! Deployment stack
//!
//! Owns the naming scope, the settings and the in-memory resource graph,
//! and hands out build contexts over them.

use serde_json::Value;
use trellis_core::domain::naming::Scope;
use trellis_core::domain::resource::ResourceHandle;
use trellis_core::dto::manifest::DeploymentManifest;
use trellis_engine::ResourceGraph;

use crate::config::Settings;
use crate::context::Context;
use crate::error::Result;
use crate::patterns::{self, Pattern};

/// A deployment under construction
///
/// # Example
/// ```
/// use serde_json::json;
/// use trellis_core::domain::naming::Scope;
/// use trellis_recipes::Stack;
/// use trellis_recipes::patterns::BucketsCluster;
///
/// let mut stack = Stack::new(Scope::new("acme", "dev"));
/// let cluster: BucketsCluster = stack
///     .compose(&json!({
///         "buckets": [{ "bucket_name": "assets", "versioned": true, "public_read_access": false }]
///     }))
///     .unwrap();
///
/// assert_eq!(cluster.buckets()[0].name, "acme-assets-bucket-dev");
/// assert_eq!(stack.synthesize().resources.len(), 1);
/// ```
#[derive(Debug)]
pub struct Stack {
    scope: Scope,
    settings: Settings,
    graph: ResourceGraph,
}

impl Stack {
    /// Creates a stack with default settings
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            settings: Settings::default(),
            graph: ResourceGraph::new(),
        }
    }

    /// Creates a stack with custom settings
    ///
    /// # Errors
    /// Returns an error if the settings do not pass [`Settings::validate`]
    pub fn with_settings(scope: Scope, settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        Ok(Self {
            scope,
            settings,
            graph: ResourceGraph::new(),
        })
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Build context over this stack
    pub fn context(&mut self) -> Context<'_> {
        Context::new(&self.scope, &self.settings, &mut self.graph)
    }

    /// Validates `configuration` and composes the pattern `P` into this stack
    pub fn compose<P: Pattern>(&mut self, configuration: &Value) -> Result<P> {
        patterns::compose(&mut self.context(), configuration)
    }

    /// Declares the alarms configured on `pattern`'s resources
    pub fn attach_alarms<P: Pattern>(&mut self, pattern: &P) -> Vec<ResourceHandle> {
        crate::alarms::attach_alarms(&mut self.context(), pattern)
    }

    /// Snapshot of everything declared so far
    pub fn synthesize(&self) -> DeploymentManifest {
        let manifest = self.graph.manifest(&self.scope);
        tracing::info!(
            manifest_id = %manifest.id,
            resources = manifest.resources.len(),
            "Synthesized deployment"
        );
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::patterns::IotQueuePipe;
    use crate::testing;
    use serde_json::json;
    use trellis_core::domain::resource::ResourceKind;

    #[test]
    fn test_synthesized_manifest() -> anyhow::Result<()> {
        let mut stack = testing::stack();
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [testing::function("process")],
            "iot_rule": {
                "rule_name": "ingest",
                "rule_disabled": false,
                "sql": "SELECT * FROM 'orders'",
                "aws_iot_sql_version": "2016-03-23"
            }
        });

        let _pipe: IotQueuePipe = stack.compose(&config)?;
        let manifest = stack.synthesize();

        assert_eq!(manifest.scope, Scope::new("acme", "dev"));
        assert_eq!(manifest.count_of(ResourceKind::Queue), 1);
        let rule = manifest.resource("acme_ingest_dev").expect("rule in manifest");
        assert_eq!(rule.depends_on, vec!["acme_orders_queue_dev", "acme_role_orders_dev"]);

        let json = serde_json::to_value(&manifest)?;
        assert_eq!(json["resources"][0]["type"], "queue");
        Ok(())
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let scope = Scope::new("acme", "dev");
        assert!(Stack::with_settings(scope.clone(), Settings::new().with_queue_batch_size(0)).is_err());
        assert!(
            Stack::with_settings(scope, Settings::new().with_default_timeout(Duration::from_secs(0)))
                .is_err()
        );
    }

    #[test]
    fn test_names_are_deterministic() -> anyhow::Result<()> {
        let config = json!({
            "topic": { "topic_name": "alerts" },
            "lambda_handlers": [testing::function("notify")]
        });

        let mut first = testing::stack();
        first.compose::<crate::patterns::TopicPipe>(&config)?;
        let mut second = testing::stack();
        second.compose::<crate::patterns::TopicPipe>(&config)?;

        let names = |stack: &Stack| -> Vec<String> {
            stack
                .graph()
                .descriptors()
                .iter()
                .map(|d| d.handle.name.clone())
                .collect()
        };
        assert_eq!(names(&first), names(&second));
        Ok(())
    }
}
