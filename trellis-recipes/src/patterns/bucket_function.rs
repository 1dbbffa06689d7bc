//! Bucket notifying a function of object events

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, function_alarm_targets, function_handles};
use crate::builders::bucket::{BucketConfig, build_bucket};
use crate::builders::function::{FunctionConfig, FunctionResource, build_function};
use crate::builders::subscription::{BucketEvent, BucketSubscription, subscribe_to_bucket};
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct BucketFunctionPipeConfig {
    pub bucket: BucketConfig,
    pub lambda_handler: FunctionConfig,
    pub events: Vec<String>,
}

/// A bucket whose object events invoke a function
///
/// Events are parsed before anything is declared, so an unknown event
/// leaves the stack untouched.
#[derive(Debug, Clone)]
pub struct BucketFunctionPipe {
    configuration: BucketFunctionPipeConfig,
    events: Vec<BucketEvent>,
    bucket: ResourceHandle,
    function: FunctionResource,
    subscription: BucketSubscription,
}

impl BucketFunctionPipe {
    pub fn configuration(&self) -> &BucketFunctionPipeConfig {
        &self.configuration
    }

    pub fn events(&self) -> &[BucketEvent] {
        &self.events
    }

    pub fn bucket(&self) -> &ResourceHandle {
        &self.bucket
    }

    pub fn function(&self) -> &FunctionResource {
        &self.function
    }

    pub fn notification(&self) -> &ResourceHandle {
        &self.subscription.notification
    }

    /// Lets the bucket invoke the function
    pub fn permission(&self) -> &ResourceHandle {
        &self.subscription.permission
    }
}

impl Pattern for BucketFunctionPipe {
    const KIND: PatternKind = PatternKind::BucketFunctionPipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: BucketFunctionPipeConfig = extract(configuration, "")?;
        let events = BucketEvent::parse_all(&configuration.events)?;

        let bucket = build_bucket(ctx, &configuration.bucket)?;
        let function = build_function(ctx, &configuration.lambda_handler)?;
        let subscription = subscribe_to_bucket(ctx, &function.handle, &bucket, &events)?;

        Ok(Self {
            configuration,
            events,
            bucket,
            function,
            subscription,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        std::iter::once(&self.bucket)
            .chain(function_handles(&self.function))
            .chain([&self.subscription.permission, &self.subscription.notification])
            .collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        function_alarm_targets(
            std::slice::from_ref(&self.function),
            std::slice::from_ref(&self.configuration.lambda_handler),
        )
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

    fn uploads(events: Value) -> Value {
        json!({
            "bucket": { "bucket_name": "uploads", "versioned": false, "public_read_access": false },
            "lambda_handler": testing::function("thumbnail"),
            "events": events
        })
    }

    #[test]
    fn test_names_follow_scope() {
        let mut stack = testing::stack();

        let pipe: BucketFunctionPipe = stack.compose(&uploads(json!(["s3:ObjectCreated:*"]))).unwrap();

        assert_eq!(pipe.bucket().name, "acme-uploads-bucket-dev");
        assert_eq!(pipe.function().handle.name, "acme_thumbnail_dev");
        assert_eq!(
            pipe.permission().name,
            "acme_thumbnail_dev_acme-uploads-bucket-dev_permission"
        );
        assert_eq!(
            pipe.notification().name,
            "acme-uploads-bucket-dev_acme_thumbnail_dev_notification"
        );
        let permission = stack.graph().get(pipe.permission().id).unwrap();
        assert_eq!(permission.property_str("principal"), Some("s3.amazonaws.com"));
        assert_eq!(permission.property_str("source_arn"), Some(pipe.bucket().arn.as_str()));
    }

    #[test]
    fn test_build_order_is_fixed() {
        let mut stack = testing::stack();

        let pipe: BucketFunctionPipe = stack
            .compose(&uploads(json!(["s3:ObjectCreated:Put", "s3:ObjectRemoved:*"])))
            .unwrap();

        let kinds: Vec<_> = pipe.resources().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Bucket,
                ResourceKind::Function,
                ResourceKind::Permission,
                ResourceKind::BucketNotification,
            ]
        );
        assert_eq!(
            pipe.events(),
            &[BucketEvent::ObjectCreatedPut, BucketEvent::ObjectRemoved]
        );
        let notification = stack.graph().get(pipe.notification().id).unwrap();
        assert_eq!(
            notification.properties["lambda_function_configurations"][0]["events"],
            json!(["s3:ObjectCreated:Put", "s3:ObjectRemoved:*"])
        );
    }

    #[test]
    fn test_unknown_event_declares_nothing() {
        let mut stack = testing::stack();

        let result = stack.compose::<BucketFunctionPipe>(&uploads(json!(["s3:ObjectTouched"])));

        assert!(matches!(
            result,
            Err(RecipeError::UnsupportedEnumValue { ref field, .. }) if field == "events"
        ));
        assert!(stack.graph().is_empty());
    }
}
