//! IoT policies

use serde::Deserialize;
use serde_json::{Map, Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct IotPolicyConfig {
    pub name: String,
    pub policy_document: Map<String, Value>,
}

/// Declares a policy devices and certificates can be attached to
///
/// The document is passed through untouched.
pub fn build_iot_policy(ctx: &mut Context<'_>, config: &IotPolicyConfig) -> Result<ResourceHandle> {
    let name = ctx.name(&config.name, NameKind::IotPolicy);
    Ok(ctx.declare(
        ResourceKind::IotPolicy,
        &name,
        json!({
            "policy_name": name,
            "policy_document": config.policy_document,
        }),
    )?)
}
