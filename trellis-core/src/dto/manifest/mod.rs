//! Deployment manifest DTOs
//!
//! The manifest is the synthesized output of a composition: every declared
//! resource with its properties, policies and dependency names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::naming::Scope;
use crate::domain::resource::{PolicyStatement, Properties, ResourceDescriptor, ResourceKind};

/// Complete description of a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// Unique identifier of this synthesis run
    pub id: Uuid,

    /// When the manifest was produced
    pub synthesized_at: DateTime<Utc>,

    /// Naming scope every resource was declared under
    pub scope: Scope,

    /// Resources in declaration order
    pub resources: Vec<ManifestResource>,
}

impl DeploymentManifest {
    /// Creates an empty manifest stamped with a fresh id and the current time
    pub fn new(scope: Scope) -> Self {
        Self {
            id: Uuid::new_v4(),
            synthesized_at: Utc::now(),
            scope,
            resources: Vec::new(),
        }
    }

    /// Finds a resource by logical id
    pub fn resource(&self, logical_id: &str) -> Option<&ManifestResource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    /// Counts resources of a given kind
    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.resources.iter().filter(|r| r.kind == kind).count()
    }
}

/// One resource as rendered in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestResource {
    pub logical_id: String,

    #[serde(rename = "type")]
    pub kind: ResourceKind,

    pub arn: String,

    pub properties: Properties,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<PolicyStatement>,

    /// Logical ids this resource must be created after
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl From<ResourceDescriptor> for ManifestResource {
    fn from(descriptor: ResourceDescriptor) -> Self {
        ManifestResource {
            logical_id: descriptor.handle.name,
            kind: descriptor.handle.kind,
            arn: descriptor.handle.arn,
            properties: descriptor.properties,
            policies: descriptor.policies,
            depends_on: Vec::new(),
        }
    }
}
