//! Dependency edges

use crate::ResourceGraph;
use crate::error::{EngineError, Result};
use trellis_core::domain::resource::{DependencyEdge, ResourceHandle, ResourceId};

impl ResourceGraph {
    /// Adds the edge `from -> to`
    ///
    /// Edges may only point backwards in declaration order, which keeps the
    /// graph acyclic. Repeating an existing edge is a no-op.
    pub(crate) fn insert_dependency(
        &mut self,
        from: &ResourceHandle,
        to: &ResourceHandle,
    ) -> Result<()> {
        self.check_handle(from)?;
        self.check_handle(to)?;

        if to.id >= from.id {
            return Err(EngineError::forward_reference(&from.name, &to.name));
        }

        let edge = DependencyEdge {
            from: from.id,
            to: to.id,
        };
        if !self.dependencies.contains(&edge) {
            tracing::debug!(from = %from.name, to = %to.name, "Declared dependency");
            self.dependencies.push(edge);
        }
        Ok(())
    }

    /// All edges in declaration order
    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.dependencies
    }

    /// Resources `id` depends on
    pub fn dependencies_of(&self, id: ResourceId) -> Vec<ResourceId> {
        self.dependencies
            .iter()
            .filter(|edge| edge.from == id)
            .map(|edge| edge.to)
            .collect()
    }

    /// Resources that depend on `id`
    pub fn dependents_of(&self, id: ResourceId) -> Vec<ResourceId> {
        self.dependencies
            .iter()
            .filter(|edge| edge.to == id)
            .map(|edge| edge.from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{EngineError, ProvisioningEngine, ResourceGraph};
    use serde_json::json;
    use trellis_core::domain::resource::{ResourceHandle, ResourceId, ResourceKind};

    #[test]
    fn test_backward_dependency_recorded_once() {
        let mut graph = ResourceGraph::new();
        let channel = graph
            .declare_resource(ResourceKind::AnalyticsChannel, "c", json!({}))
            .unwrap();
        let pipeline = graph
            .declare_resource(ResourceKind::AnalyticsPipeline, "p", json!({}))
            .unwrap();

        graph.declare_dependency(&pipeline, &channel).unwrap();
        graph.declare_dependency(&pipeline, &channel).unwrap();

        assert_eq!(graph.dependencies().len(), 1);
        assert_eq!(graph.dependencies_of(pipeline.id), vec![channel.id]);
        assert_eq!(graph.dependents_of(channel.id), vec![pipeline.id]);
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut graph = ResourceGraph::new();
        let first = graph.declare_resource(ResourceKind::Queue, "first", json!({})).unwrap();
        let second = graph.declare_resource(ResourceKind::Role, "second", json!({})).unwrap();

        let result = graph.declare_dependency(&first, &second);
        assert_eq!(
            result.unwrap_err(),
            EngineError::forward_reference("first", "second")
        );
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut graph = ResourceGraph::new();
        let queue = graph.declare_resource(ResourceKind::Queue, "q", json!({})).unwrap();
        assert!(graph.declare_dependency(&queue, &queue).is_err());
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut graph = ResourceGraph::new();
        let queue = graph.declare_resource(ResourceKind::Queue, "q", json!({})).unwrap();
        let stranger = ResourceHandle {
            id: ResourceId(7),
            kind: ResourceKind::Role,
            name: "stranger".to_string(),
            arn: "${stranger.Arn}".to_string(),
        };

        let result = graph.declare_dependency(&stranger, &queue);
        assert_eq!(
            result.unwrap_err(),
            EngineError::UnknownResource("stranger".to_string())
        );
    }
}
