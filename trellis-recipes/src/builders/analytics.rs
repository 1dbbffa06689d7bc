//! Analytics channels, datastores, pipelines and datasets
//!
//! A pipeline always starts with two activities: the channel activity, which
//! forwards to the datastore, and the datastore activity itself. Any extra
//! activities from the configuration are appended verbatim after those.

use serde::Deserialize;
use serde_json::{Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::Result;

/// Retention used by datasets that do not configure one
const DEFAULT_DATASET_RETENTION_DAYS: u32 = 90;

fn retention(days: Option<u32>) -> Value {
    match days {
        Some(days) => json!({ "number_of_days": days, "unlimited": false }),
        None => json!({ "unlimited": true }),
    }
}

pub fn build_channel(
    ctx: &mut Context<'_>,
    base_name: &str,
    retention_days: Option<u32>,
) -> Result<ResourceHandle> {
    let name = ctx.name(base_name, NameKind::Channel);
    Ok(ctx.declare(
        ResourceKind::AnalyticsChannel,
        &name,
        json!({
            "channel_name": name,
            "retention_period": retention(retention_days),
        }),
    )?)
}

pub fn build_datastore(
    ctx: &mut Context<'_>,
    base_name: &str,
    retention_days: Option<u32>,
) -> Result<ResourceHandle> {
    let name = ctx.name(base_name, NameKind::Datastore);
    Ok(ctx.declare(
        ResourceKind::AnalyticsDatastore,
        &name,
        json!({
            "datastore_name": name,
            "retention_period": retention(retention_days),
        }),
    )?)
}

/// Builds a pipeline from `channel` into `datastore`
///
/// The pipeline depends on both.
pub fn build_pipeline(
    ctx: &mut Context<'_>,
    base_name: &str,
    channel: &ResourceHandle,
    datastore: &ResourceHandle,
    extra_activities: &[Value],
) -> Result<ResourceHandle> {
    let name = ctx.name(base_name, NameKind::Pipeline);

    let mut activities = vec![
        json!({
            "channel": {
                "channel_name": channel.name,
                "name": channel.name,
                "next": datastore.name,
            }
        }),
        json!({
            "datastore": {
                "datastore_name": datastore.name,
                "name": datastore.name,
            }
        }),
    ];
    activities.extend(extra_activities.iter().cloned());

    let pipeline = ctx.declare(
        ResourceKind::AnalyticsPipeline,
        &name,
        json!({
            "pipeline_name": name,
            "pipeline_activities": activities,
        }),
    )?;

    ctx.depend(&pipeline, channel)?;
    ctx.depend(&pipeline, datastore)?;
    Ok(pipeline)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub dataset_name: String,
    pub retention_period: Option<u32>,
    pub sql_action: SqlActionConfig,
    pub trigger_action: Option<TriggerActionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlActionConfig {
    pub sql_query: String,
    pub delta_time: Option<DeltaTimeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeltaTimeConfig {
    pub timestamp_field: String,
    pub offset_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerActionConfig {
    /// Cron body, without the `cron(...)` wrapper
    pub schedule: String,
}

/// Builds a SQL dataset that depends on every resource in `dependencies`
pub fn build_dataset(
    ctx: &mut Context<'_>,
    config: &DatasetConfig,
    dependencies: &[&ResourceHandle],
) -> Result<ResourceHandle> {
    let name = ctx.name(&config.dataset_name, NameKind::Dataset);

    let retention_period = match config.retention_period {
        Some(days) => json!({ "number_of_days": days, "unlimited": false }),
        None => json!({ "number_of_days": DEFAULT_DATASET_RETENTION_DAYS, "unlimited": true }),
    };

    let filters = config.sql_action.delta_time.as_ref().map(|delta| {
        vec![json!({
            "delta_time": {
                "offset_seconds": delta.offset_seconds,
                "time_expression": format!("from_unixtime({})", delta.timestamp_field),
            }
        })]
    });

    let triggers = config.trigger_action.as_ref().map(|trigger| {
        vec![json!({
            "schedule": { "schedule_expression": format!("cron({})", trigger.schedule) }
        })]
    });

    let dataset = ctx.declare(
        ResourceKind::AnalyticsDataset,
        &name,
        json!({
            "dataset_name": name,
            "retention_period": retention_period,
            "actions": [{
                "action_name": name,
                "query_action": {
                    "sql_query": config.sql_action.sql_query,
                    "filters": filters,
                }
            }],
            "triggers": triggers,
        }),
    )?;

    for dependency in dependencies {
        ctx.depend(&dataset, dependency)?;
    }
    Ok(dataset)
}

/// Builds every dataset of a list against the same dependencies
pub fn build_datasets(
    ctx: &mut Context<'_>,
    configs: &[DatasetConfig],
    dependencies: &[&ResourceHandle],
) -> Result<Vec<ResourceHandle>> {
    configs
        .iter()
        .map(|config| build_dataset(ctx, config, dependencies))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn test_pipeline_activities_and_dependencies() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let channel = build_channel(&mut ctx, "raw-data", Some(30)).unwrap();
        let datastore = build_datastore(&mut ctx, "raw-data", None).unwrap();
        let extra = vec![json!({ "filter": { "name": "positive", "filter": "temp > 0" } })];

        let pipeline = build_pipeline(&mut ctx, "raw-data", &channel, &datastore, &extra).unwrap();

        let graph = stack.graph();
        assert_eq!(pipeline.name, "acme_raw_data_pipeline_dev");
        let activities = graph.get(pipeline.id).unwrap().properties["pipeline_activities"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0]["channel"]["next"], "acme_raw_data_datastore_dev");
        assert_eq!(activities[1]["datastore"]["name"], "acme_raw_data_datastore_dev");
        assert_eq!(activities[2], extra[0]);
        assert_eq!(graph.dependencies_of(pipeline.id), vec![channel.id, datastore.id]);
    }

    #[test]
    fn test_retention_periods() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let channel = build_channel(&mut ctx, "raw", Some(30)).unwrap();
        let datastore = build_datastore(&mut ctx, "raw", None).unwrap();

        let graph = stack.graph();
        assert_eq!(
            graph.get(channel.id).unwrap().properties["retention_period"],
            json!({ "number_of_days": 30, "unlimited": false })
        );
        assert_eq!(
            graph.get(datastore.id).unwrap().properties["retention_period"],
            json!({ "unlimited": true })
        );
    }

    #[test]
    fn test_dataset_filters_and_trigger() {
        let mut stack = testing::stack();
        let mut ctx = stack.context();
        let datastore = build_datastore(&mut ctx, "raw", None).unwrap();
        let config: DatasetConfig = serde_json::from_value(json!({
            "dataset_name": "daily-report",
            "sql_action": {
                "sql_query": "SELECT * FROM acme_raw_datastore_dev",
                "delta_time": { "timestamp_field": "ts", "offset_seconds": -60 }
            },
            "trigger_action": { "schedule": "0 6 * * ? *" }
        }))
        .unwrap();

        let dataset = build_dataset(&mut ctx, &config, &[&datastore]).unwrap();

        let graph = stack.graph();
        let descriptor = graph.get(dataset.id).unwrap();
        assert_eq!(dataset.name, "daily_report");
        let filter = &descriptor.properties["actions"][0]["query_action"]["filters"][0];
        assert_eq!(filter["delta_time"]["time_expression"], "from_unixtime(ts)");
        assert_eq!(
            descriptor.properties["triggers"][0]["schedule"]["schedule_expression"],
            "cron(0 6 * * ? *)"
        );
        assert_eq!(descriptor.properties["retention_period"]["unlimited"], true);
        assert_eq!(graph.dependencies_of(dataset.id), vec![datastore.id]);
    }
}
