//! Event sources, subscriptions and invoke permissions

use std::fmt;
use std::str::FromStr;

use serde_json::json;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use super::role::service_principal;
use crate::context::Context;
use crate::error::{RecipeError, Result};

/// Actions a queue consumer needs on its queue
pub const QUEUE_CONSUMER_ACTIONS: [&str; 5] = [
    "sqs:ReceiveMessage",
    "sqs:ChangeMessageVisibility",
    "sqs:GetQueueUrl",
    "sqs:DeleteMessage",
    "sqs:GetQueueAttributes",
];

/// Actions a stream consumer needs on a table stream
pub const STREAM_CONSUMER_ACTIONS: [&str; 4] = [
    "dynamodb:DescribeStream",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:ListStreams",
];

fn owned(actions: &[&str]) -> Vec<String> {
    actions.iter().map(|a| a.to_string()).collect()
}

/// Allows `service` to invoke `function`
///
/// # Arguments
/// * `service` - Short service name (`sns`, `events`, `iot`, ...) or a full principal
/// * `source` - Resource the invocation comes from, if it should be pinned
pub fn grant_invoke(
    ctx: &mut Context<'_>,
    function: &ResourceHandle,
    service: &str,
    source: Option<&ResourceHandle>,
) -> Result<ResourceHandle> {
    let origin = source.map(|s| s.name.as_str()).unwrap_or(service);
    let name = format!("{}_{}_permission", function.name, origin);

    let permission = ctx.declare(
        ResourceKind::Permission,
        &name,
        json!({
            "action": "lambda:InvokeFunction",
            "function_name": function.arn,
            "principal": service_principal(service),
            "source_arn": source.map(|s| s.arn.as_str()),
        }),
    )?;

    ctx.depend(&permission, function)?;
    if let Some(source) = source {
        ctx.depend(&permission, source)?;
    }
    Ok(permission)
}

/// Feeds messages from `queue` to `function`
///
/// Uses the batch size from the settings and grants the consumer actions
/// on the queue to the function.
pub fn subscribe_to_queue(
    ctx: &mut Context<'_>,
    function: &ResourceHandle,
    queue: &ResourceHandle,
) -> Result<ResourceHandle> {
    let name = format!("{}_{}_source", function.name, queue.name);
    let batch_size = ctx.settings().queue_batch_size;

    let mapping = ctx.declare(
        ResourceKind::EventSourceMapping,
        &name,
        json!({
            "event_source_arn": queue.arn,
            "function_name": function.arn,
            "batch_size": batch_size,
            "enabled": true,
        }),
    )?;
    ctx.depend(&mapping, function)?;
    ctx.depend(&mapping, queue)?;

    if function.kind.accepts_policies() {
        ctx.grant(function, &owned(&QUEUE_CONSUMER_ACTIONS), &[queue.arn.clone()])?;
    }
    Ok(mapping)
}

/// A topic subscription and the permission that lets the topic invoke
#[derive(Debug, Clone)]
pub struct TopicSubscription {
    pub subscription: ResourceHandle,
    pub permission: ResourceHandle,
}

/// Subscribes `function` to `topic`
pub fn subscribe_to_topic(
    ctx: &mut Context<'_>,
    function: &ResourceHandle,
    topic: &ResourceHandle,
) -> Result<TopicSubscription> {
    let name = format!("{}_{}_subscription", topic.name, function.name);
    let subscription = ctx.declare(
        ResourceKind::Subscription,
        &name,
        json!({
            "protocol": "lambda",
            "endpoint": function.arn,
            "topic_arn": topic.arn,
        }),
    )?;
    ctx.depend(&subscription, function)?;
    ctx.depend(&subscription, topic)?;

    let permission = grant_invoke(ctx, function, "sns", Some(topic))?;
    Ok(TopicSubscription {
        subscription,
        permission,
    })
}

/// Feeds change records from a table stream to `function`
pub fn subscribe_to_stream(
    ctx: &mut Context<'_>,
    function: &ResourceHandle,
    table: &ResourceHandle,
) -> Result<ResourceHandle> {
    let name = format!("{}_{}_source", function.name, table.name);
    let stream_arn = table.attribute("StreamArn");

    let mapping = ctx.declare(
        ResourceKind::EventSourceMapping,
        &name,
        json!({
            "event_source_arn": stream_arn,
            "function_name": function.arn,
            "starting_position": "TRIM_HORIZON",
            "batch_size": 1,
            "enabled": true,
        }),
    )?;
    ctx.depend(&mapping, function)?;
    ctx.depend(&mapping, table)?;

    if function.kind.accepts_policies() {
        ctx.grant(function, &owned(&STREAM_CONSUMER_ACTIONS), &[stream_arn])?;
    }
    Ok(mapping)
}

/// Bucket events a function can be notified of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketEvent {
    ObjectCreated,
    ObjectCreatedPut,
    ObjectCreatedPost,
    ObjectCreatedCopy,
    ObjectCreatedCompleteMultipartUpload,
    ObjectRemoved,
    ObjectRemovedDelete,
    ObjectRemovedDeleteMarkerCreated,
    ObjectRestorePost,
    ObjectRestoreCompleted,
    ReducedRedundancyLostObject,
}

impl BucketEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketEvent::ObjectCreated => "s3:ObjectCreated:*",
            BucketEvent::ObjectCreatedPut => "s3:ObjectCreated:Put",
            BucketEvent::ObjectCreatedPost => "s3:ObjectCreated:Post",
            BucketEvent::ObjectCreatedCopy => "s3:ObjectCreated:Copy",
            BucketEvent::ObjectCreatedCompleteMultipartUpload => {
                "s3:ObjectCreated:CompleteMultipartUpload"
            }
            BucketEvent::ObjectRemoved => "s3:ObjectRemoved:*",
            BucketEvent::ObjectRemovedDelete => "s3:ObjectRemoved:Delete",
            BucketEvent::ObjectRemovedDeleteMarkerCreated => "s3:ObjectRemoved:DeleteMarkerCreated",
            BucketEvent::ObjectRestorePost => "s3:ObjectRestore:Post",
            BucketEvent::ObjectRestoreCompleted => "s3:ObjectRestore:Completed",
            BucketEvent::ReducedRedundancyLostObject => "s3:ReducedRedundancyLostObject",
        }
    }

    /// Parses every event of a list, failing on the first unknown one
    pub fn parse_all(events: &[String]) -> Result<Vec<BucketEvent>> {
        events.iter().map(|e| e.parse()).collect()
    }
}

impl FromStr for BucketEvent {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "s3:ObjectCreated:*" => Ok(BucketEvent::ObjectCreated),
            "s3:ObjectCreated:Put" => Ok(BucketEvent::ObjectCreatedPut),
            "s3:ObjectCreated:Post" => Ok(BucketEvent::ObjectCreatedPost),
            "s3:ObjectCreated:Copy" => Ok(BucketEvent::ObjectCreatedCopy),
            "s3:ObjectCreated:CompleteMultipartUpload" => {
                Ok(BucketEvent::ObjectCreatedCompleteMultipartUpload)
            }
            "s3:ObjectRemoved:*" => Ok(BucketEvent::ObjectRemoved),
            "s3:ObjectRemoved:Delete" => Ok(BucketEvent::ObjectRemovedDelete),
            "s3:ObjectRemoved:DeleteMarkerCreated" => Ok(BucketEvent::ObjectRemovedDeleteMarkerCreated),
            "s3:ObjectRestore:Post" => Ok(BucketEvent::ObjectRestorePost),
            "s3:ObjectRestore:Completed" => Ok(BucketEvent::ObjectRestoreCompleted),
            "s3:ReducedRedundancyLostObject" => Ok(BucketEvent::ReducedRedundancyLostObject),
            _ => Err(RecipeError::unsupported("events", s)),
        }
    }
}

impl fmt::Display for BucketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bucket notification and the permission that lets the bucket invoke
#[derive(Debug, Clone)]
pub struct BucketSubscription {
    pub notification: ResourceHandle,
    pub permission: ResourceHandle,
}

/// Notifies `function` of `events` on `bucket`
///
/// The notification depends on the invoke permission, which is declared first.
pub fn subscribe_to_bucket(
    ctx: &mut Context<'_>,
    function: &ResourceHandle,
    bucket: &ResourceHandle,
    events: &[BucketEvent],
) -> Result<BucketSubscription> {
    let permission = grant_invoke(ctx, function, "s3", Some(bucket))?;

    let name = format!("{}_{}_notification", bucket.name, function.name);
    let events: Vec<&str> = events.iter().map(BucketEvent::as_str).collect();
    let notification = ctx.declare(
        ResourceKind::BucketNotification,
        &name,
        json!({
            "bucket": bucket.name,
            "lambda_function_configurations": [{
                "events": events,
                "lambda_function_arn": function.arn,
            }],
        }),
    )?;
    ctx.depend(&notification, bucket)?;
    ctx.depend(&notification, function)?;
    ctx.depend(&notification, &permission)?;

    Ok(BucketSubscription {
        notification,
        permission,
    })
}
