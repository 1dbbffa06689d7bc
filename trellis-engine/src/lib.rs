//! Trellis Provisioning Engine
//!
//! The seam between pattern composition and whatever actually provisions
//! resources. Builders only ever talk to a [`ProvisioningEngine`]: they
//! declare resources, dependency edges and policy attachments, and get back
//! opaque [`ResourceHandle`]s to thread into later declarations.
//!
//! [`ResourceGraph`] is the in-memory implementation. It enforces the graph
//! invariants (unique names, backward-only dependencies, policies only on
//! principals) and renders a [`DeploymentManifest`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trellis_core::domain::resource::ResourceKind;
//! use trellis_engine::{ProvisioningEngine, ResourceGraph};
//!
//! let mut graph = ResourceGraph::new();
//! let queue = graph
//!     .declare_resource(ResourceKind::Queue, "acme_orders_queue_dev", json!({}))
//!     .unwrap();
//! let role = graph
//!     .declare_resource(ResourceKind::Role, "acme_role_orders_dev", json!({}))
//!     .unwrap();
//! graph.declare_dependency(&role, &queue).unwrap();
//! graph
//!     .attach_policy(&role, &["sqs:SendMessage".to_string()], &[queue.arn.clone()])
//!     .unwrap();
//! ```

mod dependencies;
pub mod error;
mod policies;
mod resources;

// Re-export commonly used types
pub use error::{EngineError, Result};

use std::collections::HashMap;

use trellis_core::domain::naming::Scope;
use trellis_core::domain::resource::{
    DependencyEdge, ResourceDescriptor, ResourceHandle, ResourceId, ResourceKind,
};
use trellis_core::dto::manifest::{DeploymentManifest, ManifestResource};

/// Operations a provisioning engine exposes to builders
pub trait ProvisioningEngine {
    /// Declares a resource
    ///
    /// # Arguments
    /// * `kind` - Resource kind
    /// * `id` - Unique logical id (the derived physical name)
    /// * `properties` - JSON object describing the resource
    ///
    /// # Returns
    /// A handle referencing the new resource
    ///
    /// # Errors
    /// Fails on an empty or already used id, or on non-object properties
    fn declare_resource(
        &mut self,
        kind: ResourceKind,
        id: &str,
        properties: serde_json::Value,
    ) -> Result<ResourceHandle>;

    /// Records that `from` depends on `to`
    ///
    /// `to` must have been declared before `from`.
    fn declare_dependency(&mut self, from: &ResourceHandle, to: &ResourceHandle) -> Result<()>;

    /// Attaches one policy statement to a role or function
    fn attach_policy(
        &mut self,
        target: &ResourceHandle,
        actions: &[String],
        resources: &[String],
    ) -> Result<()>;
}

/// In-memory resource graph
#[derive(Debug, Default)]
pub struct ResourceGraph {
    /// Descriptors indexed by `ResourceId`
    descriptors: Vec<ResourceDescriptor>,
    /// Logical id lookup
    index: HashMap<String, ResourceId>,
    /// Dependency edges in declaration order
    dependencies: Vec<DependencyEdge>,
}

impl ResourceGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of declared resources
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Renders the graph as a deployment manifest
    ///
    /// Resources keep their declaration order. Each one lists the logical
    /// ids it depends on.
    pub fn manifest(&self, scope: &Scope) -> DeploymentManifest {
        let mut manifest = DeploymentManifest::new(scope.clone());
        manifest.resources = self
            .descriptors
            .iter()
            .map(|descriptor| {
                let depends_on = self
                    .dependencies_of(descriptor.handle.id)
                    .into_iter()
                    .filter_map(|id| self.get(id))
                    .map(|d| d.handle.name.clone())
                    .collect();
                let mut resource = ManifestResource::from(descriptor.clone());
                resource.depends_on = depends_on;
                resource
            })
            .collect();
        manifest
    }
}

impl ProvisioningEngine for ResourceGraph {
    fn declare_resource(
        &mut self,
        kind: ResourceKind,
        id: &str,
        properties: serde_json::Value,
    ) -> Result<ResourceHandle> {
        self.insert_resource(kind, id, properties)
    }

    fn declare_dependency(&mut self, from: &ResourceHandle, to: &ResourceHandle) -> Result<()> {
        self.insert_dependency(from, to)
    }

    fn attach_policy(
        &mut self,
        target: &ResourceHandle,
        actions: &[String],
        resources: &[String],
    ) -> Result<()> {
        self.insert_policy(target, actions, resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_lists_dependencies_by_name() {
        let mut graph = ResourceGraph::new();
        let queue = graph
            .declare_resource(ResourceKind::Queue, "acme_orders_queue_dev", json!({}))
            .unwrap();
        let role = graph
            .declare_resource(ResourceKind::Role, "acme_role_orders_dev", json!({}))
            .unwrap();
        graph.declare_dependency(&role, &queue).unwrap();

        let manifest = graph.manifest(&Scope::new("acme", "dev"));
        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(manifest.resources[0].logical_id, "acme_orders_queue_dev");
        let role = manifest.resource("acme_role_orders_dev").unwrap();
        assert_eq!(role.depends_on, vec!["acme_orders_queue_dev".to_string()]);
    }

    #[test]
    fn test_engine_trait_object() {
        let mut graph = ResourceGraph::new();
        let engine: &mut dyn ProvisioningEngine = &mut graph;
        engine
            .declare_resource(ResourceKind::Topic, "acme_alerts_topic_dev", json!({}))
            .unwrap();
        assert_eq!(graph.len(), 1);
        assert!(!graph.is_empty());
    }
}
