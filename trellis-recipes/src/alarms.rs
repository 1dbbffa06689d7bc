//! Alarm attachment
//!
//! Runs after a pattern is composed. Alarm entries were only checked to be
//! mappings during validation, so each one is parsed and checked here. A
//! bad alarm never fails the pattern: it is logged and skipped.

use serde_json::Value;
use trellis_core::domain::alarm::AlarmDefinition;
use trellis_core::domain::resource::ResourceHandle;

use crate::builders::alarm::build_alarm;
use crate::context::Context;
use crate::error::AlarmError;
use crate::patterns::{AlarmTarget, Pattern};

/// Declares every alarm configured on the resources of `pattern`
///
/// # Returns
/// Handles of the alarms that were declared. Skipped alarms are only
/// reported through `tracing::warn!`.
pub fn attach_alarms<P: Pattern>(ctx: &mut Context<'_>, pattern: &P) -> Vec<ResourceHandle> {
    let mut alarms = Vec::new();
    for target in pattern.alarm_targets() {
        for raw in target.alarms {
            match attach_one(ctx, &target, raw) {
                Ok(alarm) => alarms.push(alarm),
                Err(e) => tracing::warn!(
                    resource = %target.resource.name,
                    error = %e,
                    "Skipping alarm"
                ),
            }
        }
    }
    alarms
}

fn attach_one(
    ctx: &mut Context<'_>,
    target: &AlarmTarget<'_>,
    raw: &Value,
) -> Result<ResourceHandle, AlarmError> {
    let definition: AlarmDefinition =
        serde_json::from_value(raw.clone()).map_err(|e| AlarmError::Malformed(e.to_string()))?;
    definition.validate().map_err(AlarmError::Invalid)?;
    build_alarm(ctx, target.resource, target.resource_name, &definition)
}
