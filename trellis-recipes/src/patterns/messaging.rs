//! Queue and topic pipes
//!
//! A pipe is a queue or topic feeding a list of consumer functions. The IoT
//! variants add a rule that publishes matching device messages into the
//! queue or topic through a role trusted by the IoT service.

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, ensure_unclaimed, function_alarm_targets, function_handles};
use crate::builders::function::{FunctionConfig, FunctionResource, build_function};
use crate::builders::messaging::{QueueConfig, TopicConfig, build_queue, build_topic};
use crate::builders::role::build_publisher_role;
use crate::builders::rule::{IotRuleConfig, RuleAction, build_iot_rule};
use crate::builders::subscription::{TopicSubscription, subscribe_to_queue, subscribe_to_topic};
use crate::context::Context;
use crate::error::Result;

// =============================================================================
// Consumers
// =============================================================================

/// Functions reading from a queue
#[derive(Debug, Clone)]
pub struct QueueConsumers {
    pub functions: Vec<FunctionResource>,
    /// Event source mappings, one per function
    pub mappings: Vec<ResourceHandle>,
}

impl QueueConsumers {
    fn build(
        ctx: &mut Context<'_>,
        queue: &ResourceHandle,
        configs: &[FunctionConfig],
    ) -> Result<Self> {
        let mut functions = Vec::with_capacity(configs.len());
        let mut mappings = Vec::with_capacity(configs.len());
        for config in configs {
            let function = build_function(ctx, config)?;
            mappings.push(subscribe_to_queue(ctx, &function.handle, queue)?);
            functions.push(function);
        }
        Ok(Self {
            functions,
            mappings,
        })
    }

    fn handles(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.functions
            .iter()
            .zip(&self.mappings)
            .flat_map(|(function, mapping)| function_handles(function).chain(std::iter::once(mapping)))
    }
}

/// Functions subscribed to a topic
#[derive(Debug, Clone)]
pub struct TopicConsumers {
    pub functions: Vec<FunctionResource>,
    pub subscriptions: Vec<TopicSubscription>,
}

impl TopicConsumers {
    fn build(
        ctx: &mut Context<'_>,
        topic: &ResourceHandle,
        configs: &[FunctionConfig],
    ) -> Result<Self> {
        let mut functions = Vec::with_capacity(configs.len());
        let mut subscriptions = Vec::with_capacity(configs.len());
        for config in configs {
            let function = build_function(ctx, config)?;
            subscriptions.push(subscribe_to_topic(ctx, &function.handle, topic)?);
            functions.push(function);
        }
        Ok(Self {
            functions,
            subscriptions,
        })
    }

    fn handles(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.functions
            .iter()
            .zip(&self.subscriptions)
            .flat_map(|(function, subscription)| {
                function_handles(function)
                    .chain([&subscription.subscription, &subscription.permission])
            })
    }
}

// =============================================================================
// Queue pipes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct QueuePipeConfig {
    pub queue: QueueConfig,
    pub lambda_handlers: Vec<FunctionConfig>,
}

/// Queue feeding consumer functions
#[derive(Debug, Clone)]
pub struct QueuePipe {
    configuration: QueuePipeConfig,
    queue: ResourceHandle,
    consumers: QueueConsumers,
}

impl QueuePipe {
    pub fn configuration(&self) -> &QueuePipeConfig {
        &self.configuration
    }

    pub fn queue(&self) -> &ResourceHandle {
        &self.queue
    }

    pub fn consumers(&self) -> &QueueConsumers {
        &self.consumers
    }
}

impl Pattern for QueuePipe {
    const KIND: PatternKind = PatternKind::QueuePipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: QueuePipeConfig = extract(configuration, "")?;

        let queue = build_queue(ctx, &configuration.queue)?;
        let consumers = QueueConsumers::build(ctx, &queue, &configuration.lambda_handlers)?;

        Ok(Self {
            configuration,
            queue,
            consumers,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        std::iter::once(&self.queue).chain(self.consumers.handles()).collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let queue = AlarmTarget {
            resource: &self.queue,
            resource_name: &self.configuration.queue.queue_name,
            alarms: &self.configuration.queue.alarms,
        };
        std::iter::once(queue)
            .chain(function_alarm_targets(
                &self.consumers.functions,
                &self.configuration.lambda_handlers,
            ))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IotQueuePipeConfig {
    pub queue: QueueConfig,
    pub lambda_handlers: Vec<FunctionConfig>,
    pub iot_rule: IotRuleConfig,
}

/// IoT rule sending device messages into a queue that feeds consumer functions
#[derive(Debug, Clone)]
pub struct IotQueuePipe {
    configuration: IotQueuePipeConfig,
    queue: ResourceHandle,
    role: ResourceHandle,
    consumers: QueueConsumers,
    rule: ResourceHandle,
}

impl IotQueuePipe {
    pub fn configuration(&self) -> &IotQueuePipeConfig {
        &self.configuration
    }

    pub fn queue(&self) -> &ResourceHandle {
        &self.queue
    }

    /// Role the rule assumes to send into the queue
    pub fn role(&self) -> &ResourceHandle {
        &self.role
    }

    pub fn consumers(&self) -> &QueueConsumers {
        &self.consumers
    }

    pub fn rule(&self) -> &ResourceHandle {
        &self.rule
    }
}

impl Pattern for IotQueuePipe {
    const KIND: PatternKind = PatternKind::IotQueuePipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: IotQueuePipeConfig = extract(configuration, "")?;
        let rule_name = ctx.name(&configuration.iot_rule.rule_name, NameKind::IotRule);
        ensure_unclaimed(ctx, &rule_name, &configuration.lambda_handlers)?;

        let queue = build_queue(ctx, &configuration.queue)?;
        let role = build_publisher_role(ctx, &configuration.queue.queue_name, "iot", &queue)?;
        let consumers = QueueConsumers::build(ctx, &queue, &configuration.lambda_handlers)?;
        let rule = build_iot_rule(
            ctx,
            &configuration.iot_rule,
            RuleAction::Queue {
                queue: &queue,
                role: &role,
            },
        )?;

        Ok(Self {
            configuration,
            queue,
            role,
            consumers,
            rule,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        [&self.queue, &self.role]
            .into_iter()
            .chain(self.consumers.handles())
            .chain(std::iter::once(&self.rule))
            .collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let queue = AlarmTarget {
            resource: &self.queue,
            resource_name: &self.configuration.queue.queue_name,
            alarms: &self.configuration.queue.alarms,
        };
        std::iter::once(queue)
            .chain(function_alarm_targets(
                &self.consumers.functions,
                &self.configuration.lambda_handlers,
            ))
            .collect()
    }
}

// =============================================================================
// Topic pipes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TopicPipeConfig {
    pub topic: TopicConfig,
    pub lambda_handlers: Vec<FunctionConfig>,
}

/// Topic fanning out to subscribed functions
#[derive(Debug, Clone)]
pub struct TopicPipe {
    configuration: TopicPipeConfig,
    topic: ResourceHandle,
    consumers: TopicConsumers,
}

impl TopicPipe {
    pub fn configuration(&self) -> &TopicPipeConfig {
        &self.configuration
    }

    pub fn topic(&self) -> &ResourceHandle {
        &self.topic
    }

    pub fn consumers(&self) -> &TopicConsumers {
        &self.consumers
    }
}

impl Pattern for TopicPipe {
    const KIND: PatternKind = PatternKind::TopicPipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: TopicPipeConfig = extract(configuration, "")?;

        let topic = build_topic(ctx, &configuration.topic)?;
        let consumers = TopicConsumers::build(ctx, &topic, &configuration.lambda_handlers)?;

        Ok(Self {
            configuration,
            topic,
            consumers,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        std::iter::once(&self.topic).chain(self.consumers.handles()).collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let topic = AlarmTarget {
            resource: &self.topic,
            resource_name: &self.configuration.topic.topic_name,
            alarms: &self.configuration.topic.alarms,
        };
        std::iter::once(topic)
            .chain(function_alarm_targets(
                &self.consumers.functions,
                &self.configuration.lambda_handlers,
            ))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IotTopicPipeConfig {
    pub topic: TopicConfig,
    pub lambda_handlers: Vec<FunctionConfig>,
    pub iot_rule: IotRuleConfig,
}

/// IoT rule publishing device messages to a topic with subscribed functions
#[derive(Debug, Clone)]
pub struct IotTopicPipe {
    configuration: IotTopicPipeConfig,
    topic: ResourceHandle,
    role: ResourceHandle,
    consumers: TopicConsumers,
    rule: ResourceHandle,
}

impl IotTopicPipe {
    pub fn configuration(&self) -> &IotTopicPipeConfig {
        &self.configuration
    }

    pub fn topic(&self) -> &ResourceHandle {
        &self.topic
    }

    /// Role the rule assumes to publish to the topic
    pub fn role(&self) -> &ResourceHandle {
        &self.role
    }

    pub fn consumers(&self) -> &TopicConsumers {
        &self.consumers
    }

    pub fn rule(&self) -> &ResourceHandle {
        &self.rule
    }
}

impl Pattern for IotTopicPipe {
    const KIND: PatternKind = PatternKind::IotTopicPipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: IotTopicPipeConfig = extract(configuration, "")?;
        let rule_name = ctx.name(&configuration.iot_rule.rule_name, NameKind::IotRule);
        ensure_unclaimed(ctx, &rule_name, &configuration.lambda_handlers)?;

        let topic = build_topic(ctx, &configuration.topic)?;
        let role = build_publisher_role(ctx, &configuration.topic.topic_name, "iot", &topic)?;
        let consumers = TopicConsumers::build(ctx, &topic, &configuration.lambda_handlers)?;
        let rule = build_iot_rule(
            ctx,
            &configuration.iot_rule,
            RuleAction::Topic {
                topic: &topic,
                role: &role,
            },
        )?;

        Ok(Self {
            configuration,
            topic,
            role,
            consumers,
            rule,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        [&self.topic, &self.role]
            .into_iter()
            .chain(self.consumers.handles())
            .chain(std::iter::once(&self.rule))
            .collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let topic = AlarmTarget {
            resource: &self.topic,
            resource_name: &self.configuration.topic.topic_name,
            alarms: &self.configuration.topic.alarms,
        };
        std::iter::once(topic)
            .chain(function_alarm_targets(
                &self.consumers.functions,
                &self.configuration.lambda_handlers,
            ))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;
    use crate::testing;
    use serde_json::json;
    use trellis_core::domain::resource::ResourceKind;

    fn iot_rule() -> Value {
        json!({
            "rule_name": "ingest",
            "rule_disabled": false,
            "sql": "SELECT * FROM 'devices/+/orders'",
            "aws_iot_sql_version": "2016-03-23"
        })
    }

    #[test]
    fn test_iot_queue_pipe_end_to_end() {
        let mut stack = testing::stack();
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [testing::function("process")],
            "iot_rule": iot_rule()
        });

        let pipe: IotQueuePipe = stack.compose(&config).unwrap();

        assert_eq!(pipe.queue().name, "acme_orders_queue_dev");
        assert_eq!(pipe.consumers().functions.len(), 1);

        let graph = stack.graph();
        let mapping = graph.get(pipe.consumers().mappings[0].id).unwrap();
        assert_eq!(mapping.properties["batch_size"], 10);
        assert_eq!(mapping.property_str("event_source_arn"), Some(pipe.queue().arn.as_str()));

        let role = graph.get(pipe.role().id).unwrap();
        assert_eq!(role.policies[0].actions, vec!["sqs:SendMessage".to_string()]);
        assert_eq!(role.policies[0].resources, vec![pipe.queue().arn.clone()]);

        let rule = graph.get(pipe.rule().id).unwrap();
        let action = &rule.properties["topic_rule_payload"]["actions"][0]["sqs"];
        assert_eq!(action["role_arn"], "${acme_role_orders_dev.Arn}");
        assert_eq!(action["queue_url"], "${acme_orders_queue_dev.Url}");
        assert_eq!(rule.property_str("rule_name"), Some("acme_ingest_dev"));
    }

    #[test]
    fn test_iot_rule_named_after_consumer_rejected() {
        let mut stack = testing::stack();
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [testing::function("ingest")],
            "iot_rule": iot_rule()
        });

        let result = stack.compose::<IotQueuePipe>(&config);

        assert!(matches!(result, Err(RecipeError::Engine(ref e)) if e.is_duplicate()));
        assert!(stack.graph().is_empty());
    }

    #[test]
    fn test_build_order_is_fixed() {
        let mut stack = testing::stack();
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [testing::function("process"), testing::function("audit")],
            "iot_rule": iot_rule()
        });

        let pipe: IotQueuePipe = stack.compose(&config).unwrap();

        let kinds: Vec<_> = pipe.resources().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Queue,
                ResourceKind::Role,
                ResourceKind::Function,
                ResourceKind::EventSourceMapping,
                ResourceKind::Function,
                ResourceKind::EventSourceMapping,
                ResourceKind::IotRule,
            ]
        );
        let ids: Vec<_> = pipe.resources().iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(stack.graph().len(), 7);
    }

    #[test]
    fn test_topic_pipe_subscribes_consumers() {
        let mut stack = testing::stack();
        let config = json!({
            "topic": { "topic_name": "alerts" },
            "lambda_handlers": [testing::function("notify")]
        });

        let pipe: TopicPipe = stack.compose(&config).unwrap();

        let subscription = &pipe.consumers().subscriptions[0];
        let graph = stack.graph();
        assert_eq!(subscription.subscription.name, "acme_alerts_topic_dev_acme_notify_dev_subscription");
        assert_eq!(
            graph.get(subscription.permission.id).unwrap().property_str("principal"),
            Some("sns.amazonaws.com")
        );
    }

    #[test]
    fn test_iot_topic_pipe_role_publishes() {
        let mut stack = testing::stack();
        let config = json!({
            "topic": { "topic_name": "alerts" },
            "lambda_handlers": [],
            "iot_rule": iot_rule()
        });

        let pipe: IotTopicPipe = stack.compose(&config).unwrap();

        let graph = stack.graph();
        let role = graph.get(pipe.role().id).unwrap();
        assert_eq!(role.policies[0].actions, vec!["sns:Publish".to_string()]);
        let rule = graph.get(pipe.rule().id).unwrap();
        assert_eq!(
            rule.properties["topic_rule_payload"]["actions"][0]["sns"]["target_arn"],
            pipe.topic().arn
        );
    }

    #[test]
    fn test_invalid_configuration_declares_nothing() {
        let mut stack = testing::stack();
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [{ "lambda_name": "process" }],
            "iot_rule": iot_rule()
        });

        let result = stack.compose::<IotQueuePipe>(&config);

        let err = result.unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("lambda_handlers[0].runtime"));
        assert!(stack.graph().is_empty());
    }

    #[test]
    fn test_unsupported_runtime_stops_composition() {
        let mut stack = testing::stack();
        let mut function = testing::function("process");
        function["runtime"] = json!("PYTHON_9");
        let config = json!({
            "queue": { "queue_name": "orders" },
            "lambda_handlers": [function]
        });

        let result = stack.compose::<QueuePipe>(&config);

        assert!(matches!(result, Err(RecipeError::UnsupportedEnumValue { .. })));
        assert!(stack.graph().find("acme_process_dev").is_none());
        assert_eq!(stack.graph().len(), 1);
    }
}
