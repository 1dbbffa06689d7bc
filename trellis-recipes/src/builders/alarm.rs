//! Metric alarms

use serde_json::json;
use trellis_core::domain::alarm::AlarmDefinition;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::AlarmError;

/// Metric namespace and dimension for resources that publish metrics
fn metric_source(kind: ResourceKind) -> Option<(&'static str, &'static str)> {
    match kind {
        ResourceKind::Queue => Some(("AWS/SQS", "QueueName")),
        ResourceKind::Topic => Some(("AWS/SNS", "TopicName")),
        ResourceKind::Function => Some(("AWS/Lambda", "FunctionName")),
        ResourceKind::Table => Some(("AWS/DynamoDB", "TableName")),
        _ => None,
    }
}

/// Declares a threshold alarm on a metric of `resource`
///
/// # Arguments
/// * `resource` - Alarmed resource
/// * `resource_name` - Name the configuration gave the resource, used in the alarm name
/// * `alarm` - Checked alarm definition
///
/// # Errors
/// - `NotAlarmable` when the resource publishes no metrics
/// - `Engine` when the declaration is rejected, e.g. a duplicate alarm name
pub fn build_alarm(
    ctx: &mut Context<'_>,
    resource: &ResourceHandle,
    resource_name: &str,
    alarm: &AlarmDefinition,
) -> Result<ResourceHandle, AlarmError> {
    let (namespace, dimension) =
        metric_source(resource.kind).ok_or_else(|| AlarmError::NotAlarmable {
            name: resource.name.clone(),
            kind: resource.kind,
        })?;

    let name = ctx.scope().alarm_name(resource_name, &alarm.metric_name);
    let handle = ctx.declare(
        ResourceKind::Alarm,
        &name,
        json!({
            "alarm_name": name,
            "namespace": namespace,
            "metric_name": alarm.metric_name,
            "dimensions": { dimension: resource.name },
            "statistic": "Average",
            "period": 300,
            "comparison_operator": "GreaterThanOrEqualToThreshold",
            "threshold": alarm.threshold,
            "evaluation_periods": alarm.evaluation_periods,
            "datapoints_to_alarm": alarm.datapoints_to_alarm,
            "actions_enabled": alarm.actions_enabled,
        }),
    )?;
    ctx.depend(&handle, resource)?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    fn definition() -> AlarmDefinition {
        serde_json::from_value(json!({
            "name": "ApproximateNumberOfMessagesVisible",
            "number": 100,
            "periods": 3,
            "points": 2,
            "actions": true
        }))
        .unwrap()
    }

    #[test]
    fn test_queue_alarm() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let queue = ctx.declare(ResourceKind::Queue, "acme_orders_queue_dev", json!({})).unwrap();

        let alarm = build_alarm(&mut ctx, &queue, "orders", &definition()).unwrap();

        let graph = stack.graph();
        assert_eq!(alarm.name, "acme_orders_ApproximateNumberOfMessagesVisible_dev");
        let descriptor = graph.get(alarm.id).unwrap();
        assert_eq!(descriptor.property_str("namespace"), Some("AWS/SQS"));
        assert_eq!(descriptor.properties["dimensions"]["QueueName"], "acme_orders_queue_dev");
        assert_eq!(descriptor.properties["threshold"], 100.0);
        assert_eq!(graph.dependencies_of(alarm.id), vec![queue.id]);
    }

    #[test]
    fn test_bucket_not_alarmable() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let bucket = ctx.declare(ResourceKind::Bucket, "acme-site-bucket-dev", json!({})).unwrap();

        let result = build_alarm(&mut ctx, &bucket, "site", &definition());
        assert!(matches!(result, Err(AlarmError::NotAlarmable { .. })));
    }

    #[test]
    fn test_duplicate_alarm_rejected_by_engine() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let queue = ctx.declare(ResourceKind::Queue, "acme_orders_queue_dev", json!({})).unwrap();

        build_alarm(&mut ctx, &queue, "orders", &definition()).unwrap();
        let result = build_alarm(&mut ctx, &queue, "orders", &definition());
        assert!(matches!(result, Err(AlarmError::Engine(ref e)) if e.is_duplicate()));
    }
}
