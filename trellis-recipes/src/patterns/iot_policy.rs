//! Standalone IoT policy

use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::Pattern;
use crate::builders::iot_policy::{IotPolicyConfig, build_iot_policy};
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct IotPolicy {
    configuration: IotPolicyConfig,
    policy: ResourceHandle,
}

impl IotPolicy {
    pub fn configuration(&self) -> &IotPolicyConfig {
        &self.configuration
    }

    pub fn policy(&self) -> &ResourceHandle {
        &self.policy
    }
}

impl Pattern for IotPolicy {
    const KIND: PatternKind = PatternKind::IotPolicy;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: IotPolicyConfig = extract(configuration, "")?;
        let policy = build_iot_policy(ctx, &configuration)?;
        Ok(Self {
            configuration,
            policy,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        vec![&self.policy]
    }
}
