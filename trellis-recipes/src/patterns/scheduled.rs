//! Functions triggered on a schedule

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, ensure_unclaimed, function_alarm_targets, function_handles};
use crate::builders::function::{FunctionConfig, FunctionResource, build_functions};
use crate::builders::rule::{ScheduleRuleConfig, build_schedule_rule};
use crate::builders::subscription::grant_invoke;
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledFunctionsConfig {
    pub cloudwatch_rule: ScheduleRuleConfig,
    pub lambda_handlers: Vec<FunctionConfig>,
}

/// A schedule rule targeting a list of functions
///
/// The rule name may not resolve to the name of one of the functions or of
/// their keep-warm rules.
#[derive(Debug, Clone)]
pub struct ScheduledFunctions {
    configuration: ScheduledFunctionsConfig,
    functions: Vec<FunctionResource>,
    rule: ResourceHandle,
    permissions: Vec<ResourceHandle>,
}

impl ScheduledFunctions {
    pub fn configuration(&self) -> &ScheduledFunctionsConfig {
        &self.configuration
    }

    pub fn functions(&self) -> &[FunctionResource] {
        &self.functions
    }

    pub fn rule(&self) -> &ResourceHandle {
        &self.rule
    }

    pub fn permissions(&self) -> &[ResourceHandle] {
        &self.permissions
    }
}

impl Pattern for ScheduledFunctions {
    const KIND: PatternKind = PatternKind::ScheduledFunctions;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: ScheduledFunctionsConfig = extract(configuration, "")?;
        let rule_name = ctx.name(&configuration.cloudwatch_rule.rule_name, NameKind::EventRule);
        ensure_unclaimed(ctx, &rule_name, &configuration.lambda_handlers)?;

        let functions = build_functions(ctx, &configuration.lambda_handlers)?;
        let targets: Vec<&ResourceHandle> = functions.iter().map(|f| &f.handle).collect();
        let rule = build_schedule_rule(ctx, &configuration.cloudwatch_rule, &targets)?;

        let mut permissions = Vec::with_capacity(functions.len());
        for function in &functions {
            permissions.push(grant_invoke(ctx, &function.handle, "events", Some(&rule))?);
        }

        Ok(Self {
            configuration,
            functions,
            rule,
            permissions,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        self.functions
            .iter()
            .flat_map(function_handles)
            .chain(std::iter::once(&self.rule))
            .chain(&self.permissions)
            .collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        function_alarm_targets(&self.functions, &self.configuration.lambda_handlers).collect()
    }
}
