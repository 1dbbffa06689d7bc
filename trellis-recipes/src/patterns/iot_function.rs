//! IoT rule invoking a function directly

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, ensure_unclaimed, function_alarm_targets, function_handles};
use crate::builders::function::{FunctionConfig, FunctionResource, build_function};
use crate::builders::rule::{IotRuleConfig, RuleAction, build_iot_rule};
use crate::builders::subscription::grant_invoke;
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct IotFunctionPipeConfig {
    pub lambda_handler: FunctionConfig,
    pub iot_rule: IotRuleConfig,
}

/// IoT rule with a Lambda action
#[derive(Debug, Clone)]
pub struct IotFunctionPipe {
    configuration: IotFunctionPipeConfig,
    function: FunctionResource,
    rule: ResourceHandle,
    permission: ResourceHandle,
}

impl IotFunctionPipe {
    pub fn configuration(&self) -> &IotFunctionPipeConfig {
        &self.configuration
    }

    pub fn function(&self) -> &FunctionResource {
        &self.function
    }

    pub fn rule(&self) -> &ResourceHandle {
        &self.rule
    }

    /// Lets the rule invoke the function
    pub fn permission(&self) -> &ResourceHandle {
        &self.permission
    }
}

impl Pattern for IotFunctionPipe {
    const KIND: PatternKind = PatternKind::IotFunctionPipe;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: IotFunctionPipeConfig = extract(configuration, "")?;
        let rule_name = ctx.name(&configuration.iot_rule.rule_name, NameKind::IotRule);
        ensure_unclaimed(
            ctx,
            &rule_name,
            std::slice::from_ref(&configuration.lambda_handler),
        )?;

        let function = build_function(ctx, &configuration.lambda_handler)?;
        let rule = build_iot_rule(
            ctx,
            &configuration.iot_rule,
            RuleAction::Function {
                function: &function.handle,
            },
        )?;
        let permission = grant_invoke(ctx, &function.handle, "iot", Some(&rule))?;

        Ok(Self {
            configuration,
            function,
            rule,
            permission,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        function_handles(&self.function)
            .chain([&self.rule, &self.permission])
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
