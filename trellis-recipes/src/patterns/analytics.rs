//! Analytics topologies
//!
//! Three shapes built from the same pieces: a single channel, datastore and
//! pipeline (workflow), many channels into one datastore (fan-in) and one
//! channel into many datastores (fan-out). Datasets always come last and
//! depend on everything else the pattern declared.

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::Pattern;
use crate::builders::analytics::{
    DatasetConfig, build_channel, build_datasets, build_datastore, build_pipeline,
};
use crate::context::Context;
use crate::error::Result;

// =============================================================================
// Workflow
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetentionPeriods {
    pub channel: Option<u32>,
    pub datastore: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsWorkflowConfig {
    pub name: String,
    #[serde(default)]
    pub retention_periods: RetentionPeriods,
    #[serde(default)]
    pub extra_activities: Vec<Value>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

/// Channel, datastore and pipeline sharing one base name
#[derive(Debug, Clone)]
pub struct AnalyticsWorkflow {
    channel: ResourceHandle,
    datastore: ResourceHandle,
    pipeline: ResourceHandle,
    datasets: Vec<ResourceHandle>,
}

impl AnalyticsWorkflow {
    pub fn channel(&self) -> &ResourceHandle {
        &self.channel
    }

    pub fn datastore(&self) -> &ResourceHandle {
        &self.datastore
    }

    pub fn pipeline(&self) -> &ResourceHandle {
        &self.pipeline
    }

    pub fn datasets(&self) -> &[ResourceHandle] {
        &self.datasets
    }
}

impl Pattern for AnalyticsWorkflow {
    const KIND: PatternKind = PatternKind::AnalyticsWorkflow;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: AnalyticsWorkflowConfig = extract(configuration, "")?;
        let name = configuration.name.as_str();
        let retention = &configuration.retention_periods;

        let channel = build_channel(ctx, name, retention.channel)?;
        let datastore = build_datastore(ctx, name, retention.datastore)?;
        let pipeline = build_pipeline(
            ctx,
            name,
            &channel,
            &datastore,
            &configuration.extra_activities,
        )?;
        let datasets = build_datasets(
            ctx,
            &configuration.datasets,
            &[&channel, &datastore, &pipeline],
        )?;

        Ok(Self {
            channel,
            datastore,
            pipeline,
            datasets,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        [&self.channel, &self.datastore, &self.pipeline]
            .into_iter()
            .chain(&self.datasets)
            .collect()
    }
}

// =============================================================================
// Fan-in
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelPipeDefinition {
    pub name: String,
    pub channel_retention_period: Option<u32>,
    #[serde(default)]
    pub extra_activities: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreDefinition {
    pub name: String,
    pub datastore_retention_period: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsFanInConfig {
    pub channel_pipe_definition: Vec<ChannelPipeDefinition>,
    pub datastore_definition: DatastoreDefinition,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

/// Many channels, each with its own pipeline, into one datastore
#[derive(Debug, Clone)]
pub struct AnalyticsFanIn {
    datastore: ResourceHandle,
    channels: Vec<ResourceHandle>,
    pipelines: Vec<ResourceHandle>,
    datasets: Vec<ResourceHandle>,
}

impl AnalyticsFanIn {
    pub fn datastore(&self) -> &ResourceHandle {
        &self.datastore
    }

    pub fn channels(&self) -> &[ResourceHandle] {
        &self.channels
    }

    /// Pipelines, in the same order as [`channels`](Self::channels)
    pub fn pipelines(&self) -> &[ResourceHandle] {
        &self.pipelines
    }

    pub fn datasets(&self) -> &[ResourceHandle] {
        &self.datasets
    }
}

impl Pattern for AnalyticsFanIn {
    const KIND: PatternKind = PatternKind::AnalyticsFanIn;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: AnalyticsFanInConfig = extract(configuration, "")?;
        let store = &configuration.datastore_definition;

        let datastore = build_datastore(ctx, &store.name, store.datastore_retention_period)?;

        let definitions = &configuration.channel_pipe_definition;
        let mut channels = Vec::with_capacity(definitions.len());
        let mut pipelines = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let channel = build_channel(ctx, &definition.name, definition.channel_retention_period)?;
            let pipeline = build_pipeline(
                ctx,
                &definition.name,
                &channel,
                &datastore,
                &definition.extra_activities,
            )?;
            channels.push(channel);
            pipelines.push(pipeline);
        }

        let dependencies: Vec<&ResourceHandle> = std::iter::once(&datastore)
            .chain(&channels)
            .chain(&pipelines)
            .collect();
        let datasets = build_datasets(ctx, &configuration.datasets, &dependencies)?;

        Ok(Self {
            datastore,
            channels,
            pipelines,
            datasets,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        let pairs = self
            .channels
            .iter()
            .zip(&self.pipelines)
            .flat_map(|(channel, pipeline)| [channel, pipeline]);
        std::iter::once(&self.datastore)
            .chain(pairs)
            .chain(&self.datasets)
            .collect()
    }
}

// =============================================================================
// Fan-out
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDefinition {
    pub name: String,
    pub channel_retention_period: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatastorePipeDefinition {
    pub name: String,
    pub datastore_retention_period: Option<u32>,
    #[serde(default)]
    pub extra_activities: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsFanOutConfig {
    pub channel_definition: ChannelDefinition,
    pub datastore_pipe_definition: Vec<DatastorePipeDefinition>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

/// One channel feeding many datastores, each through its own pipeline
#[derive(Debug, Clone)]
pub struct AnalyticsFanOut {
    channel: ResourceHandle,
    datastores: Vec<ResourceHandle>,
    pipelines: Vec<ResourceHandle>,
    datasets: Vec<ResourceHandle>,
}

impl AnalyticsFanOut {
    pub fn channel(&self) -> &ResourceHandle {
        &self.channel
    }

    pub fn datastores(&self) -> &[ResourceHandle] {
        &self.datastores
    }

    /// Pipelines, in the same order as [`datastores`](Self::datastores)
    pub fn pipelines(&self) -> &[ResourceHandle] {
        &self.pipelines
    }

    pub fn datasets(&self) -> &[ResourceHandle] {
        &self.datasets
    }
}

impl Pattern for AnalyticsFanOut {
    const KIND: PatternKind = PatternKind::AnalyticsFanOut;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: AnalyticsFanOutConfig = extract(configuration, "")?;
        let source = &configuration.channel_definition;

        let channel = build_channel(ctx, &source.name, source.channel_retention_period)?;

        let definitions = &configuration.datastore_pipe_definition;
        let mut datastores = Vec::with_capacity(definitions.len());
        let mut pipelines = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let datastore =
                build_datastore(ctx, &definition.name, definition.datastore_retention_period)?;
            let pipeline = build_pipeline(
                ctx,
                &definition.name,
                &channel,
                &datastore,
                &definition.extra_activities,
            )?;
            datastores.push(datastore);
            pipelines.push(pipeline);
        }

        let dependencies: Vec<&ResourceHandle> = std::iter::once(&channel)
            .chain(&datastores)
            .chain(&pipelines)
            .collect();
        let datasets = build_datasets(ctx, &configuration.datasets, &dependencies)?;

        Ok(Self {
            channel,
            datastores,
            pipelines,
            datasets,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        let pairs = self
            .datastores
            .iter()
            .zip(&self.pipelines)
            .flat_map(|(datastore, pipeline)| [datastore, pipeline]);
        std::iter::once(&self.channel)
            .chain(pairs)
            .chain(&self.datasets)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use trellis_core::domain::resource::ResourceKind;

    fn dataset() -> Value {
        json!({
            "dataset_name": "hourly-summary",
            "sql_action": { "sql_query": "SELECT * FROM telemetry" }
        })
    }

    #[test]
    fn test_workflow_shares_base_name() {
        let mut stack = testing::stack();
        let config = json!({
            "name": "telemetry",
            "retention_periods": { "channel": 7 },
            "datasets": [dataset()]
        });

        let workflow: AnalyticsWorkflow = stack.compose(&config).unwrap();

        let graph = stack.graph();
        assert_eq!(workflow.channel().name, "acme_telemetry_channel_dev");
        assert_eq!(workflow.datastore().name, "acme_telemetry_datastore_dev");
        assert_eq!(workflow.pipeline().name, "acme_telemetry_pipeline_dev");
        assert_eq!(
            graph.get(workflow.channel().id).unwrap().properties["retention_period"]["number_of_days"],
            7
        );
        let dataset = &workflow.datasets()[0];
        assert_eq!(dataset.name, "hourly_summary");
        assert_eq!(
            graph.dependencies_of(dataset.id),
            vec![workflow.channel().id, workflow.datastore().id, workflow.pipeline().id]
        );
    }

    #[test]
    fn test_fan_in_topology() {
        let mut stack = testing::stack();
        let config = json!({
            "channel_pipe_definition": [
                { "name": "north" },
                { "name": "south", "channel_retention_period": 30 },
                { "name": "east" }
            ],
            "datastore_definition": { "name": "telemetry" },
            "datasets": [dataset()]
        });

        let fan_in: AnalyticsFanIn = stack.compose(&config).unwrap();

        let graph = stack.graph();
        assert_eq!(graph.of_kind(ResourceKind::AnalyticsDatastore).count(), 1);
        assert_eq!(fan_in.channels().len(), 3);
        assert_eq!(fan_in.pipelines().len(), 3);
        for (channel, pipeline) in fan_in.channels().iter().zip(fan_in.pipelines()) {
            assert_eq!(
                graph.dependencies_of(pipeline.id),
                vec![channel.id, fan_in.datastore().id]
            );
        }
        assert_eq!(fan_in.pipelines()[1].name, "acme_south_pipeline_dev");
        assert_eq!(graph.dependencies_of(fan_in.datasets()[0].id).len(), 7);
        assert_eq!(fan_in.resources().len(), 8);
    }

    #[test]
    fn test_fan_out_topology() {
        let mut stack = testing::stack();
        let config = json!({
            "channel_definition": { "name": "telemetry" },
            "datastore_pipe_definition": [
                { "name": "hot", "datastore_retention_period": 7 },
                {
                    "name": "cold",
                    "extra_activities": [{ "remove_attributes": { "name": "strip", "attributes": ["raw"] } }]
                }
            ]
        });

        let fan_out: AnalyticsFanOut = stack.compose(&config).unwrap();

        let graph = stack.graph();
        assert_eq!(graph.of_kind(ResourceKind::AnalyticsChannel).count(), 1);
        assert_eq!(fan_out.datastores().len(), 2);
        for (datastore, pipeline) in fan_out.datastores().iter().zip(fan_out.pipelines()) {
            assert_eq!(
                graph.dependencies_of(pipeline.id),
                vec![fan_out.channel().id, datastore.id]
            );
        }
        let cold = graph.get(fan_out.pipelines()[1].id).unwrap();
        assert_eq!(cold.properties["pipeline_activities"].as_array().unwrap().len(), 3);
        assert!(fan_out.datasets().is_empty());
    }
}
