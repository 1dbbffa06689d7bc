//! IoT topic rules and scheduled rules

use serde::Deserialize;
use serde_json::{Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::Result;

/// IoT topic rule configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IotRuleConfig {
    pub rule_name: String,
    pub description: Option<String>,
    pub rule_disabled: bool,
    pub sql: String,
    pub aws_iot_sql_version: String,
}

/// What an IoT rule does with matching messages
#[derive(Debug, Clone, Copy)]
pub enum RuleAction<'a> {
    /// Send to a queue, assuming `role`
    Queue {
        queue: &'a ResourceHandle,
        role: &'a ResourceHandle,
    },
    /// Publish to a topic, assuming `role`
    Topic {
        topic: &'a ResourceHandle,
        role: &'a ResourceHandle,
    },
    /// Invoke a function
    Function { function: &'a ResourceHandle },
}

impl RuleAction<'_> {
    fn to_json(self) -> Value {
        match self {
            RuleAction::Queue { queue, role } => json!({
                "sqs": {
                    "queue_url": queue.url(),
                    "role_arn": role.arn,
                    "use_base64": false,
                }
            }),
            RuleAction::Topic { topic, role } => json!({
                "sns": {
                    "target_arn": topic.arn,
                    "role_arn": role.arn,
                    "message_format": "RAW",
                }
            }),
            RuleAction::Function { function } => json!({
                "lambda": { "function_arn": function.arn }
            }),
        }
    }

    fn targets(&self) -> Vec<&ResourceHandle> {
        match *self {
            RuleAction::Queue { queue, role } => vec![queue, role],
            RuleAction::Topic { topic, role } => vec![topic, role],
            RuleAction::Function { function } => vec![function],
        }
    }
}

/// Builds an IoT topic rule with a single action
///
/// The rule depends on every resource its action references.
pub fn build_iot_rule(
    ctx: &mut Context<'_>,
    config: &IotRuleConfig,
    action: RuleAction<'_>,
) -> Result<ResourceHandle> {
    let name = ctx.name(&config.rule_name, NameKind::IotRule);
    let rule = ctx.declare(
        ResourceKind::IotRule,
        &name,
        json!({
            "rule_name": name,
            "topic_rule_payload": {
                "actions": [action.to_json()],
                "description": config.description,
                "rule_disabled": config.rule_disabled,
                "sql": config.sql,
                "aws_iot_sql_version": config.aws_iot_sql_version,
            }
        }),
    )?;

    for target in action.targets() {
        ctx.depend(&rule, target)?;
    }
    Ok(rule)
}

/// Scheduled rule configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRuleConfig {
    pub rule_name: String,
    pub description: Option<String>,
    pub enabled: bool,
    /// Cron body, without the `cron(...)` wrapper
    pub schedule: String,
}

/// Builds a scheduled rule that targets `targets`
pub fn build_schedule_rule(
    ctx: &mut Context<'_>,
    config: &ScheduleRuleConfig,
    targets: &[&ResourceHandle],
) -> Result<ResourceHandle> {
    let name = ctx.name(&config.rule_name, NameKind::EventRule);
    declare_schedule(
        ctx,
        &name,
        config.description.as_deref(),
        config.enabled,
        &config.schedule,
        targets,
    )
}

pub(crate) fn declare_schedule(
    ctx: &mut Context<'_>,
    name: &str,
    description: Option<&str>,
    enabled: bool,
    schedule: &str,
    targets: &[&ResourceHandle],
) -> Result<ResourceHandle> {
    let arns: Vec<&str> = targets.iter().map(|t| t.arn.as_str()).collect();
    let rule = ctx.declare(
        ResourceKind::EventRule,
        name,
        json!({
            "rule_name": name,
            "description": description,
            "enabled": enabled,
            "schedule_expression": format!("cron({})", schedule),
            "targets": arns,
        }),
    )?;

    for target in targets {
        ctx.depend(&rule, target)?;
    }
    Ok(rule)
}
