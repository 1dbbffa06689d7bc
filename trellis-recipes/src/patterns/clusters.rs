//! Plain lists of functions or buckets

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, function_alarm_targets, function_handles};
use crate::builders::bucket::{BucketConfig, build_buckets};
use crate::builders::function::{FunctionConfig, FunctionResource, build_functions};
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionsClusterConfig {
    pub functions: Vec<FunctionConfig>,
}

#[derive(Debug, Clone)]
pub struct FunctionsCluster {
    configuration: FunctionsClusterConfig,
    functions: Vec<FunctionResource>,
}

impl FunctionsCluster {
    pub fn functions(&self) -> &[FunctionResource] {
        &self.functions
    }
}

impl Pattern for FunctionsCluster {
    const KIND: PatternKind = PatternKind::FunctionsCluster;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: FunctionsClusterConfig = extract(configuration, "")?;
        let functions = build_functions(ctx, &configuration.functions)?;
        Ok(Self {
            configuration,
            functions,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        self.functions.iter().flat_map(function_handles).collect()
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        function_alarm_targets(&self.functions, &self.configuration.functions).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketsClusterConfig {
    pub buckets: Vec<BucketConfig>,
}

#[derive(Debug, Clone)]
pub struct BucketsCluster {
    buckets: Vec<ResourceHandle>,
}

impl BucketsCluster {
    pub fn buckets(&self) -> &[ResourceHandle] {
        &self.buckets
    }
}

impl Pattern for BucketsCluster {
    const KIND: PatternKind = PatternKind::BucketsCluster;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: BucketsClusterConfig = extract(configuration, "")?;
        Ok(Self {
            buckets: build_buckets(ctx, &configuration.buckets)?,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        self.buckets.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn test_functions_cluster_with_keep_warm() {
        let mut stack = testing::stack();
        let mut warm = testing::function("warm");
        warm["keep_warm"] = json!({ "enabled": true, "rate": "0/5 * * * ? *" });
        let config = json!({ "functions": [testing::function("cold"), warm] });

        let cluster: FunctionsCluster = stack.compose(&config).unwrap();

        assert_eq!(cluster.functions().len(), 2);
        assert_eq!(cluster.resources().len(), 4);
        assert_eq!(stack.graph().len(), 4);
        let rule = cluster.functions()[1].keep_warm_rule.as_ref().unwrap();
        assert_eq!(
            stack.graph().get(rule.id).unwrap().property_str("schedule_expression"),
            Some("cron(0/5 * * * ? *)")
        );
    }

    #[test]
    fn test_buckets_cluster() {
        let mut stack = testing::stack();
        let config = json!({
            "buckets": [
                { "bucket_name": "raw_uploads", "versioned": true, "public_read_access": false },
                { "bucket_name": "thumbnails", "versioned": false, "public_read_access": true }
            ]
        });

        let cluster: BucketsCluster = stack.compose(&config).unwrap();

        let names: Vec<_> = cluster.buckets().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["acme-raw-uploads-bucket-dev", "acme-thumbnails-bucket-dev"]);
    }
}
