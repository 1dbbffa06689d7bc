//! Policy attachments

use crate::ResourceGraph;
use crate::error::{EngineError, Result};
use trellis_core::domain::resource::{PolicyStatement, ResourceHandle, ResourceId};

impl ResourceGraph {
    pub(crate) fn insert_policy(
        &mut self,
        target: &ResourceHandle,
        actions: &[String],
        resources: &[String],
    ) -> Result<()> {
        self.check_handle(target)?;

        if !target.kind.accepts_policies() {
            return Err(EngineError::PolicyNotSupported {
                name: target.name.clone(),
                kind: target.kind,
            });
        }
        if actions.is_empty() || resources.is_empty() {
            return Err(EngineError::EmptyPolicy(target.name.clone()));
        }

        tracing::debug!(
            target = %target.name,
            actions = ?actions,
            resources = ?resources,
            "Attached policy"
        );

        self.descriptors[target.id.0].policies.push(PolicyStatement {
            actions: actions.to_vec(),
            resources: resources.to_vec(),
        });
        Ok(())
    }

    /// Statements attached to a resource
    pub fn policies_of(&self, id: ResourceId) -> &[PolicyStatement] {
        self.get(id).map(|d| d.policies.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use crate::{EngineError, ProvisioningEngine, ResourceGraph};
    use serde_json::json;
    use trellis_core::domain::resource::ResourceKind;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_attach_to_role() {
        let mut graph = ResourceGraph::new();
        let queue = graph.declare_resource(ResourceKind::Queue, "q", json!({})).unwrap();
        let role = graph.declare_resource(ResourceKind::Role, "r", json!({})).unwrap();

        graph
            .attach_policy(&role, &strings(&["sqs:SendMessage"]), &[queue.arn.clone()])
            .unwrap();

        let policies = graph.policies_of(role.id);
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].actions, strings(&["sqs:SendMessage"]));
        assert_eq!(policies[0].resources, vec![queue.arn]);
    }

    #[test]
    fn test_attach_to_queue_rejected() {
        let mut graph = ResourceGraph::new();
        let queue = graph.declare_resource(ResourceKind::Queue, "q", json!({})).unwrap();

        let result = graph.attach_policy(&queue, &strings(&["sqs:*"]), &strings(&["*"]));
        assert!(matches!(
            result,
            Err(EngineError::PolicyNotSupported { kind: ResourceKind::Queue, .. })
        ));
        assert!(graph.policies_of(queue.id).is_empty());
    }

    #[test]
    fn test_empty_statement_rejected() {
        let mut graph = ResourceGraph::new();
        let function = graph.declare_resource(ResourceKind::Function, "f", json!({})).unwrap();

        let result = graph.attach_policy(&function, &[], &strings(&["*"]));
        assert_eq!(result.unwrap_err(), EngineError::EmptyPolicy("f".to_string()));
    }
}
