//! Pattern composers
//!
//! A pattern wires several builders together in a fixed order. Composition
//! always validates the configuration against the registered schema first,
//! so a rejected configuration never declares anything.

pub mod analytics;
pub mod api;
pub mod bucket_function;
pub mod clusters;
pub mod iot_function;
pub mod iot_policy;
pub mod messaging;
pub mod scheduled;
pub mod user_backend;

use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_engine::EngineError;
use trellis_schema::{PatternKind, standard_registry};

use crate::builders::function::{FunctionConfig, FunctionResource, planned_names};
use crate::context::Context;
use crate::error::Result;

pub use analytics::{AnalyticsFanIn, AnalyticsFanOut, AnalyticsWorkflow};
pub use api::RestApiService;
pub use bucket_function::BucketFunctionPipe;
pub use clusters::{BucketsCluster, FunctionsCluster};
pub use iot_function::IotFunctionPipe;
pub use iot_policy::IotPolicy;
pub use messaging::{IotQueuePipe, IotTopicPipe, QueuePipe, TopicPipe};
pub use scheduled::ScheduledFunctions;
pub use user_backend::{UserPoolGroups, UserServerlessBackend};

/// A composable deployment pattern
pub trait Pattern: Sized {
    /// Schema the configuration is validated against
    const KIND: PatternKind;

    /// Declares the pattern's resources from an already validated configuration
    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self>;

    /// Every resource the pattern declared, in declaration order
    fn resources(&self) -> Vec<&ResourceHandle>;

    /// Resources that carry configured alarms
    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        Vec::new()
    }
}

/// A resource together with the raw alarm entries configured for it
#[derive(Debug, Clone, Copy)]
pub struct AlarmTarget<'a> {
    pub resource: &'a ResourceHandle,
    /// Base name from the configuration, used in alarm names
    pub resource_name: &'a str,
    pub alarms: &'a [Value],
}

/// Validates `configuration` and composes the pattern `P`
///
/// # Errors
/// - `Configuration` when the configuration does not match the schema of
///   `P::KIND`; nothing is declared in that case
/// - Any builder error raised while composing
pub fn compose<P: Pattern>(ctx: &mut Context<'_>, configuration: &Value) -> Result<P> {
    standard_registry().validate(P::KIND, configuration)?;

    tracing::info!(
        pattern = P::KIND.as_str(),
        prefix = %ctx.scope().prefix,
        environment = %ctx.scope().environment,
        "Composing pattern"
    );
    P::build(ctx, configuration)
}

/// Pairs built functions with their configurations for alarm attachment
fn function_alarm_targets<'a>(
    functions: &'a [FunctionResource],
    configs: &'a [FunctionConfig],
) -> impl Iterator<Item = AlarmTarget<'a>> {
    functions.iter().zip(configs).map(|(function, config)| AlarmTarget {
        resource: &function.handle,
        resource_name: &config.lambda_name,
        alarms: &config.alarms,
    })
}

/// Handles of a function and of the keep-warm resources it may own
fn function_handles(function: &FunctionResource) -> impl Iterator<Item = &ResourceHandle> {
    std::iter::once(&function.handle)
        .chain(function.keep_warm_rule.as_ref())
        .chain(function.keep_warm_permission.as_ref())
}

/// Fails with `DuplicateResource` when one of `functions` would claim `name`
///
/// Rules share the `{p}_{n}_{e}` layout with functions, so a rule named
/// after a function (or after its keep-warm rule) is rejected before
/// anything is declared.
fn ensure_unclaimed(ctx: &Context<'_>, name: &str, functions: &[FunctionConfig]) -> Result<()> {
    let claimed = functions
        .iter()
        .any(|config| planned_names(ctx, config).iter().any(|n| n == name));
    if claimed {
        return Err(EngineError::DuplicateResource(name.to_string()).into());
    }
    Ok(())
}
