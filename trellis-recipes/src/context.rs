//! Build context
//!
//! Everything a builder needs besides its own parameters: the naming scope,
//! the settings, and the engine to declare resources against.

use serde_json::Value;
use trellis_core::domain::naming::{NameKind, Scope};
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};
use trellis_engine::ProvisioningEngine;

use crate::config::Settings;

/// Build context handed to builders and composers
pub struct Context<'a> {
    scope: &'a Scope,
    settings: &'a Settings,
    engine: &'a mut dyn ProvisioningEngine,
}

impl<'a> Context<'a> {
    pub fn new(
        scope: &'a Scope,
        settings: &'a Settings,
        engine: &'a mut dyn ProvisioningEngine,
    ) -> Self {
        Self {
            scope,
            settings,
            engine,
        }
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    /// Derives a scoped resource name
    pub fn name(&self, base: &str, kind: NameKind) -> String {
        self.scope.resource_name(base, kind)
    }

    /// Declares a resource
    pub fn declare(
        &mut self,
        kind: ResourceKind,
        name: &str,
        properties: Value,
    ) -> trellis_engine::Result<ResourceHandle> {
        self.engine.declare_resource(kind, name, properties)
    }

    /// Records that `from` depends on `to`
    pub fn depend(
        &mut self,
        from: &ResourceHandle,
        to: &ResourceHandle,
    ) -> trellis_engine::Result<()> {
        self.engine.declare_dependency(from, to)
    }

    /// Allows `actions` on `resources` for a role or function
    pub fn grant(
        &mut self,
        target: &ResourceHandle,
        actions: &[String],
        resources: &[String],
    ) -> trellis_engine::Result<()> {
        self.engine.attach_policy(target, actions, resources)
    }
}
