//! Resource declaration and lookup

use crate::ResourceGraph;
use crate::error::{EngineError, Result};
use serde_json::Value;
use trellis_core::domain::resource::{
    ResourceDescriptor, ResourceHandle, ResourceId, ResourceKind,
};

impl ResourceGraph {
    // =============================================================================
    // Declaration
    // =============================================================================

    pub(crate) fn insert_resource(
        &mut self,
        kind: ResourceKind,
        id: &str,
        properties: Value,
    ) -> Result<ResourceHandle> {
        if id.trim().is_empty() {
            return Err(EngineError::InvalidIdentifier(id.to_string()));
        }
        if self.index.contains_key(id) {
            return Err(EngineError::DuplicateResource(id.to_string()));
        }
        let Value::Object(properties) = properties else {
            return Err(EngineError::InvalidProperties(id.to_string()));
        };

        let arn = if kind.is_reference() {
            properties
                .get("arn")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| EngineError::MissingReferenceArn(id.to_string()))?
        } else {
            format!("${{{}.Arn}}", id)
        };

        let handle = ResourceHandle {
            id: ResourceId(self.descriptors.len()),
            kind,
            name: id.to_string(),
            arn,
        };

        tracing::debug!(kind = %kind, name = id, id = %handle.id, "Declared resource");

        self.index.insert(id.to_string(), handle.id);
        self.descriptors.push(ResourceDescriptor {
            handle: handle.clone(),
            properties,
            policies: Vec::new(),
        });

        Ok(handle)
    }

    /// Ensures a handle was issued by this graph
    pub(crate) fn check_handle(&self, handle: &ResourceHandle) -> Result<()> {
        match self.descriptors.get(handle.id.0) {
            Some(descriptor) if descriptor.handle == *handle => Ok(()),
            _ => Err(EngineError::UnknownResource(handle.name.clone())),
        }
    }

    // =============================================================================
    // Lookup
    // =============================================================================

    /// Get a descriptor by id
    pub fn get(&self, id: ResourceId) -> Option<&ResourceDescriptor> {
        self.descriptors.get(id.0)
    }

    /// Find a descriptor by logical id
    pub fn find(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.index.get(name).and_then(|id| self.get(*id))
    }

    /// All descriptors in declaration order
    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    /// Descriptors of one kind, in declaration order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceDescriptor> {
        self.descriptors
            .iter()
            .filter(move |d| d.handle.kind == kind)
    }
}
