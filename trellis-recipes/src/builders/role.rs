//! Service roles

use serde_json::json;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::{RecipeError, Result};

/// Expands a short service name to its principal
///
/// `iot` becomes `iot.amazonaws.com`; anything containing a dot is
/// returned unchanged.
pub fn service_principal(service: &str) -> String {
    if service.contains('.') {
        service.to_string()
    } else {
        format!("{}.amazonaws.com", service)
    }
}

/// Builds a role trusted by a single service principal
///
/// # Arguments
/// * `base_name` - Base name for the role and its inline policy
/// * `service` - Service allowed to assume the role
/// * `actions` - Allowed actions
/// * `resources` - Resources the actions are allowed on
pub fn build_service_role(
    ctx: &mut Context<'_>,
    base_name: &str,
    service: &str,
    actions: &[String],
    resources: &[String],
) -> Result<ResourceHandle> {
    let role_name = ctx.name(base_name, NameKind::Role);
    let policy_name = ctx.name(base_name, NameKind::Policy);

    let role = ctx.declare(
        ResourceKind::Role,
        &role_name,
        json!({
            "role_name": role_name,
            "assumed_by": service_principal(service),
            "policy_name": policy_name,
        }),
    )?;
    ctx.grant(&role, actions, resources)?;
    Ok(role)
}

/// Builds a role that lets `service` publish into `target` and nothing else
///
/// # Errors
/// `UnsupportedEnumValue` when `target` is not a queue, topic or channel
pub fn build_publisher_role(
    ctx: &mut Context<'_>,
    base_name: &str,
    service: &str,
    target: &ResourceHandle,
) -> Result<ResourceHandle> {
    let action = match target.kind {
        ResourceKind::Queue => "sqs:SendMessage",
        ResourceKind::Topic => "sns:Publish",
        ResourceKind::AnalyticsChannel => "iotanalytics:BatchPutMessage",
        other => return Err(RecipeError::unsupported("publisher target", other.as_str())),
    };

    let role = build_service_role(
        ctx,
        base_name,
        service,
        &[action.to_string()],
        &[target.arn.clone()],
    )?;
    ctx.depend(&role, target)?;
    Ok(role)
}
