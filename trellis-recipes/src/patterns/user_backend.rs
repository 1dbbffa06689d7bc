//! User-facing serverless backends and user pool groups

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, function_alarm_targets, function_handles};
use crate::builders::bucket::{BucketConfig, build_buckets};
use crate::builders::function::{AuthorizerConfig, ResolvedFunction, resolve_authorizer};
use crate::builders::table::{TableConfig, TableResource, build_table};
use crate::builders::user_pool::{
    UserPoolConfig, UserPoolGroupConfig, UserPoolGroupResource, UserPoolResource,
    build_user_pool, build_user_pool_group,
};
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct UserServerlessBackendConfig {
    pub authorizer_function: Option<AuthorizerConfig>,
    #[serde(default)]
    pub buckets: Vec<BucketConfig>,
    #[serde(default)]
    pub dynamo_tables: Vec<TableConfig>,
    pub user_pool: UserPoolConfig,
}

/// User pool with its tables, buckets and an optional authorizer function
#[derive(Debug, Clone)]
pub struct UserServerlessBackend {
    configuration: UserServerlessBackendConfig,
    authorizer_function: Option<ResolvedFunction>,
    tables: Vec<TableResource>,
    buckets: Vec<ResourceHandle>,
    user_pool: UserPoolResource,
}

impl UserServerlessBackend {
    pub fn configuration(&self) -> &UserServerlessBackendConfig {
        &self.configuration
    }

    pub fn authorizer_function(&self) -> Option<&ResolvedFunction> {
        self.authorizer_function.as_ref()
    }

    pub fn tables(&self) -> &[TableResource] {
        &self.tables
    }

    pub fn buckets(&self) -> &[ResourceHandle] {
        &self.buckets
    }

    pub fn user_pool(&self) -> &UserPoolResource {
        &self.user_pool
    }
}

impl Pattern for UserServerlessBackend {
    const KIND: PatternKind = PatternKind::UserServerlessBackend;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: UserServerlessBackendConfig = extract(configuration, "")?;

        let authorizer_function = match &configuration.authorizer_function {
            Some(config) => Some(resolve_authorizer(ctx, config)?),
            None => None,
        };

        let mut tables = Vec::with_capacity(configuration.dynamo_tables.len());
        for table in &configuration.dynamo_tables {
            tables.push(build_table(ctx, table)?);
        }

        let buckets = build_buckets(ctx, &configuration.buckets)?;
        let user_pool = build_user_pool(ctx, &configuration.user_pool)?;

        Ok(Self {
            configuration,
            authorizer_function,
            tables,
            buckets,
            user_pool,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        let mut resources = Vec::new();
        match &self.authorizer_function {
            Some(ResolvedFunction::Origin(function)) => resources.extend(function_handles(function)),
            Some(ResolvedFunction::Imported(handle)) => resources.push(handle),
            None => {}
        }
        for table in &self.tables {
            resources.push(&table.handle);
            if let Some(function) = &table.stream_function {
                resources.extend(function_handles(function));
            }
            resources.extend(&table.stream_mapping);
        }
        resources.extend(&self.buckets);
        for (_, function) in &self.user_pool.triggers {
            resources.extend(function_handles(function));
        }
        resources.push(&self.user_pool.pool);
        resources.extend(&self.user_pool.permissions);
        resources.extend(&self.user_pool.client);
        resources
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let mut targets = Vec::new();
        if let (Some(ResolvedFunction::Origin(function)), Some(config)) = (
            &self.authorizer_function,
            self.configuration
                .authorizer_function
                .as_ref()
                .and_then(|a| a.origin.as_ref()),
        ) {
            targets.extend(function_alarm_targets(
                std::slice::from_ref(function),
                std::slice::from_ref(config),
            ));
        }

        for (table, config) in self.tables.iter().zip(&self.configuration.dynamo_tables) {
            targets.push(AlarmTarget {
                resource: &table.handle,
                resource_name: &config.table_name,
                alarms: &config.alarms,
            });
            let stream_config = config.stream.as_ref().and_then(|s| s.function.as_ref());
            if let (Some(function), Some(stream_config)) = (&table.stream_function, stream_config) {
                targets.extend(function_alarm_targets(
                    std::slice::from_ref(function),
                    std::slice::from_ref(stream_config),
                ));
            }
        }

        for ((_, function), (_, config)) in self
            .user_pool
            .triggers
            .iter()
            .zip(self.configuration.user_pool.triggers.entries())
        {
            targets.push(AlarmTarget {
                resource: &function.handle,
                resource_name: &config.lambda_name,
                alarms: &config.alarms,
            });
        }
        targets
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPoolGroupsConfig {
    pub user_pool_groups: Vec<UserPoolGroupConfig>,
}

/// Groups of an existing user pool, each bound to its own role
#[derive(Debug, Clone)]
pub struct UserPoolGroups {
    groups: Vec<UserPoolGroupResource>,
}

impl UserPoolGroups {
    pub fn groups(&self) -> &[UserPoolGroupResource] {
        &self.groups
    }
}

impl Pattern for UserPoolGroups {
    const KIND: PatternKind = PatternKind::UserPoolGroups;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: UserPoolGroupsConfig = extract(configuration, "")?;

        let mut groups = Vec::with_capacity(configuration.user_pool_groups.len());
        for group in &configuration.user_pool_groups {
            groups.push(build_user_pool_group(ctx, group)?);
        }
        Ok(Self { groups })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        self.groups
            .iter()
            .flat_map(|group| [&group.role, &group.group])
            .collect()
    }
}
