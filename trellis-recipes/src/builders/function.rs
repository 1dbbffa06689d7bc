//! Function builder
//!
//! Builds functions from their configuration, optionally with a keep-warm
//! schedule, and resolves authorizer functions that are either built here
//! or imported by ARN.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use super::rule::declare_schedule;
use super::subscription::grant_invoke;
use crate::context::Context;
use crate::error::{RecipeError, Result};

/// Supported function runtimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Python27,
    Python36,
    Python37,
    Python38,
    Nodejs10,
    Nodejs12,
    Java8,
    Java11,
    Go1,
    DotnetCore21,
    DotnetCore31,
    Ruby25,
    Ruby27,
    Provided,
}

impl Runtime {
    /// Identifier the function service expects
    pub fn identifier(&self) -> &'static str {
        match self {
            Runtime::Python27 => "python2.7",
            Runtime::Python36 => "python3.6",
            Runtime::Python37 => "python3.7",
            Runtime::Python38 => "python3.8",
            Runtime::Nodejs10 => "nodejs10.x",
            Runtime::Nodejs12 => "nodejs12.x",
            Runtime::Java8 => "java8",
            Runtime::Java11 => "java11",
            Runtime::Go1 => "go1.x",
            Runtime::DotnetCore21 => "dotnetcore2.1",
            Runtime::DotnetCore31 => "dotnetcore3.1",
            Runtime::Ruby25 => "ruby2.5",
            Runtime::Ruby27 => "ruby2.7",
            Runtime::Provided => "provided",
        }
    }
}

impl FromStr for Runtime {
    type Err = RecipeError;

    /// Parses the upper-case names used in configurations, e.g. `PYTHON_3_8`
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PYTHON_2_7" => Ok(Runtime::Python27),
            "PYTHON_3_6" => Ok(Runtime::Python36),
            "PYTHON_3_7" => Ok(Runtime::Python37),
            "PYTHON_3_8" => Ok(Runtime::Python38),
            "NODEJS_10_X" => Ok(Runtime::Nodejs10),
            "NODEJS_12_X" => Ok(Runtime::Nodejs12),
            "JAVA_8" => Ok(Runtime::Java8),
            "JAVA_11" => Ok(Runtime::Java11),
            "GO_1_X" => Ok(Runtime::Go1),
            "DOTNET_CORE_2_1" => Ok(Runtime::DotnetCore21),
            "DOTNET_CORE_3_1" => Ok(Runtime::DotnetCore31),
            "RUBY_2_5" => Ok(Runtime::Ruby25),
            "RUBY_2_7" => Ok(Runtime::Ruby27),
            "PROVIDED" => Ok(Runtime::Provided),
            other => Err(RecipeError::unsupported("runtime", other)),
        }
    }
}

/// Function configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    pub lambda_name: String,
    pub description: Option<String>,
    pub code_path: Option<String>,
    pub runtime: String,
    pub handler: String,
    #[serde(default)]
    pub layers: Vec<String>,
    pub timeout: Option<u64>,
    pub reserved_concurrent_executions: Option<u32>,
    #[serde(default)]
    pub environment_vars: BTreeMap<String, String>,
    pub iam_actions: Vec<String>,
    /// Raw alarm entries, parsed when alarms are attached
    #[serde(default)]
    pub alarms: Vec<Value>,
    pub keep_warm: Option<KeepWarmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepWarmConfig {
    pub enabled: bool,
    /// Cron body, without the `cron(...)` wrapper
    pub rate: Option<String>,
}

/// A built function
#[derive(Debug, Clone)]
pub struct FunctionResource {
    pub handle: ResourceHandle,
    /// Actions granted to the function on `*`
    pub iam_actions: Vec<String>,
    pub keep_warm_rule: Option<ResourceHandle>,
    /// Lets the keep-warm rule invoke the function
    pub keep_warm_permission: Option<ResourceHandle>,
}

/// Builds a function
///
/// # Arguments
/// * `ctx` - Build context
/// * `config` - Function configuration
///
/// # Returns
/// The function handle together with the actions it was granted
///
/// # Errors
/// - `UnsupportedEnumValue` for an unknown runtime, before anything is declared
/// - `MissingRequiredSubResource` when neither the configuration nor the
///   settings provide a code path
pub fn build_function(ctx: &mut Context<'_>, config: &FunctionConfig) -> Result<FunctionResource> {
    let runtime: Runtime = config.runtime.parse()?;
    let code_path = resolve_code_path(ctx, config)?;

    let name = ctx.name(&config.lambda_name, NameKind::Function);
    let timeout = config
        .timeout
        .unwrap_or_else(|| ctx.settings().default_timeout.as_secs());

    let handle = ctx.declare(
        ResourceKind::Function,
        &name,
        json!({
            "function_name": name,
            "description": config.description,
            "runtime": runtime.identifier(),
            "handler": config.handler,
            "code": { "asset": code_path },
            "timeout": timeout,
            "reserved_concurrent_executions": config.reserved_concurrent_executions,
            "environment": config.environment_vars,
            "layers": config.layers,
            "tracing": "Active",
        }),
    )?;

    if !config.iam_actions.is_empty() {
        ctx.grant(&handle, &config.iam_actions, &["*".to_string()])?;
    }

    let (keep_warm_rule, keep_warm_permission) = match &config.keep_warm {
        Some(keep_warm) if keep_warm.enabled => {
            let (rule, permission) = build_keep_warm(ctx, &config.lambda_name, &handle, keep_warm)?;
            (Some(rule), Some(permission))
        }
        _ => (None, None),
    };

    Ok(FunctionResource {
        handle,
        iam_actions: config.iam_actions.clone(),
        keep_warm_rule,
        keep_warm_permission,
    })
}

/// Names `build_function` would declare for `config`
///
/// The function itself, then its keep-warm rule when one is enabled.
pub fn planned_names(ctx: &Context<'_>, config: &FunctionConfig) -> Vec<String> {
    let mut names = vec![ctx.name(&config.lambda_name, NameKind::Function)];
    if config.keep_warm.as_ref().is_some_and(|k| k.enabled) {
        names.push(ctx.name(&config.lambda_name, NameKind::KeepWarmRule));
    }
    names
}

/// Builds every function of a list, in order
pub fn build_functions(
    ctx: &mut Context<'_>,
    configs: &[FunctionConfig],
) -> Result<Vec<FunctionResource>> {
    configs.iter().map(|config| build_function(ctx, config)).collect()
}

fn resolve_code_path(ctx: &Context<'_>, config: &FunctionConfig) -> Result<String> {
    config
        .code_path
        .clone()
        .or_else(|| {
            ctx.settings()
                .default_code_path
                .as_ref()
                .map(|path| path.display().to_string())
        })
        .ok_or_else(|| {
            RecipeError::missing(format!(
                "code path for function '{}' (set 'code_path' or a default code path)",
                config.lambda_name
            ))
        })
}

fn build_keep_warm(
    ctx: &mut Context<'_>,
    lambda_name: &str,
    function: &ResourceHandle,
    config: &KeepWarmConfig,
) -> Result<(ResourceHandle, ResourceHandle)> {
    let name = ctx.name(lambda_name, NameKind::KeepWarmRule);
    let schedule = config
        .rate
        .clone()
        .unwrap_or_else(|| ctx.settings().keep_warm_schedule.clone());
    let description = format!("Keep warm rule for {}", function.name);

    let rule = declare_schedule(
        ctx,
        &name,
        Some(description.as_str()),
        true,
        &schedule,
        &[function],
    )?;
    let permission = grant_invoke(ctx, function, "events", Some(&rule))?;
    Ok((rule, permission))
}

// =============================================================================
// Imported functions and authorizers
// =============================================================================

/// Function that already exists outside the deployment
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedFunctionConfig {
    pub arn: String,
    pub identifier: String,
}

/// Declares a reference to an existing function
pub fn import_function(
    ctx: &mut Context<'_>,
    config: &ImportedFunctionConfig,
) -> Result<ResourceHandle> {
    Ok(ctx.declare(
        ResourceKind::ImportedFunction,
        &config.identifier,
        json!({ "arn": config.arn }),
    )?)
}

/// Function built here (`origin`) or imported by ARN (`imported`)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizerConfig {
    pub origin: Option<FunctionConfig>,
    pub imported: Option<ImportedFunctionConfig>,
}

impl AuthorizerConfig {
    /// Checks that at least one variant is present
    pub fn ensure_present(&self) -> Result<()> {
        if self.origin.is_none() && self.imported.is_none() {
            return Err(RecipeError::missing(
                "authorizer_function requires 'imported' or 'origin'",
            ));
        }
        Ok(())
    }
}

/// An authorizer function after resolution
#[derive(Debug, Clone)]
pub enum ResolvedFunction {
    Imported(ResourceHandle),
    Origin(FunctionResource),
}

impl ResolvedFunction {
    pub fn handle(&self) -> &ResourceHandle {
        match self {
            ResolvedFunction::Imported(handle) => handle,
            ResolvedFunction::Origin(function) => &function.handle,
        }
    }

    /// The built function, when it was not imported
    pub fn origin(&self) -> Option<&FunctionResource> {
        match self {
            ResolvedFunction::Imported(_) => None,
            ResolvedFunction::Origin(function) => Some(function),
        }
    }
}

/// Resolves an authorizer function
///
/// `imported` takes precedence: when it is present `origin` is never built.
///
/// # Errors
/// `MissingRequiredSubResource` when neither variant is configured
pub fn resolve_authorizer(
    ctx: &mut Context<'_>,
    config: &AuthorizerConfig,
) -> Result<ResolvedFunction> {
    if let Some(imported) = &config.imported {
        return Ok(ResolvedFunction::Imported(import_function(ctx, imported)?));
    }
    if let Some(origin) = &config.origin {
        return Ok(ResolvedFunction::Origin(build_function(ctx, origin)?));
    }
    Err(RecipeError::missing(
        "authorizer_function requires 'imported' or 'origin'",
    ))
}
