//! Queues and topics

use serde::Deserialize;
use serde_json::{Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    pub queue_name: String,
    /// Seconds
    pub queue_delivery_delay: Option<u32>,
    /// Seconds
    pub queue_message_visibility: Option<u32>,
    #[serde(default)]
    pub alarms: Vec<Value>,
}

pub fn build_queue(ctx: &mut Context<'_>, config: &QueueConfig) -> Result<ResourceHandle> {
    let name = ctx.name(&config.queue_name, NameKind::Queue);
    Ok(ctx.declare(
        ResourceKind::Queue,
        &name,
        json!({
            "queue_name": name,
            "delivery_delay": config.queue_delivery_delay,
            "visibility_timeout": config.queue_message_visibility,
        }),
    )?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    pub topic_name: String,
    #[serde(default)]
    pub alarms: Vec<Value>,
}

pub fn build_topic(ctx: &mut Context<'_>, config: &TopicConfig) -> Result<ResourceHandle> {
    let name = ctx.name(&config.topic_name, NameKind::Topic);
    Ok(ctx.declare(
        ResourceKind::Topic,
        &name,
        json!({
            "topic_name": name,
            "display_name": name,
        }),
    )?)
}
