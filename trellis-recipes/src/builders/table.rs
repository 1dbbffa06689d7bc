//! Key-value tables

use serde::Deserialize;
use serde_json::{Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use super::function::{FunctionConfig, FunctionResource, build_function};
use super::subscription::subscribe_to_stream;
use crate::context::Context;
use crate::error::{RecipeError, Result};

/// Capacity used for provisioned tables and indexes that do not set one
const DEFAULT_CAPACITY: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: Option<KeyConfig>,
    pub stream: Option<StreamConfig>,
    pub ttl_attribute: Option<String>,
    pub billing_mode: Option<String>,
    pub read_capacity: Option<u32>,
    pub write_capacity: Option<u32>,
    #[serde(default)]
    pub global_secondary_indexes: Vec<GlobalIndexConfig>,
    #[serde(default)]
    pub local_secondary_indexes: Vec<LocalIndexConfig>,
    #[serde(default)]
    pub alarms: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub enabled: bool,
    pub function: Option<FunctionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalIndexConfig {
    pub index_name: String,
    pub partition_key: String,
    pub sort_key: Option<KeyConfig>,
    pub read_capacity: Option<u32>,
    pub write_capacity: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalIndexConfig {
    pub index_name: String,
    pub sort_key: KeyConfig,
}

/// A built table and its optional stream consumer
#[derive(Debug, Clone)]
pub struct TableResource {
    pub handle: ResourceHandle,
    pub stream_function: Option<FunctionResource>,
    /// Event source mapping feeding the stream to `stream_function`
    pub stream_mapping: Option<ResourceHandle>,
}

fn attribute_type(field: &str, key_type: &str) -> Result<&'static str> {
    match key_type.to_ascii_lowercase().as_str() {
        "string" => Ok("S"),
        "integer" | "number" => Ok("N"),
        "binary" => Ok("B"),
        _ => Err(RecipeError::unsupported(field, key_type)),
    }
}

fn key(field: &str, key: &KeyConfig) -> Result<Value> {
    Ok(json!({ "name": key.name, "type": attribute_type(field, &key.key_type)? }))
}

fn partition(name: &str) -> Value {
    json!({ "name": name, "type": "S" })
}

/// Builds a table
///
/// Every enum-like value is checked before the table is declared. When the
/// stream is enabled and has a function, the function is built after the
/// table and subscribed to its stream.
pub fn build_table(ctx: &mut Context<'_>, config: &TableConfig) -> Result<TableResource> {
    let provisioned = match config.billing_mode.as_deref() {
        None => false,
        Some(mode) if mode.eq_ignore_ascii_case("pay_per_request") => false,
        Some(mode) if mode.eq_ignore_ascii_case("provisioned") => true,
        Some(other) => return Err(RecipeError::unsupported("billing_mode", other)),
    };

    let sort_key = config
        .sort_key
        .as_ref()
        .map(|k| key("sort_key.type", k))
        .transpose()?;

    let mut global_indexes = Vec::with_capacity(config.global_secondary_indexes.len());
    for index in &config.global_secondary_indexes {
        let sort_key = index
            .sort_key
            .as_ref()
            .map(|k| key("global_secondary_indexes.sort_key.type", k))
            .transpose()?;
        global_indexes.push(json!({
            "index_name": index.index_name,
            "partition_key": partition(&index.partition_key),
            "sort_key": sort_key,
            "read_capacity": index.read_capacity.unwrap_or(DEFAULT_CAPACITY),
            "write_capacity": index.write_capacity.unwrap_or(DEFAULT_CAPACITY),
        }));
    }

    let mut local_indexes = Vec::with_capacity(config.local_secondary_indexes.len());
    for index in &config.local_secondary_indexes {
        local_indexes.push(json!({
            "index_name": index.index_name,
            "sort_key": key("local_secondary_indexes.sort_key.type", &index.sort_key)?,
        }));
    }

    let stream_view = config
        .stream
        .as_ref()
        .is_some_and(|s| s.enabled)
        .then_some("NEW_AND_OLD_IMAGES");
    let (billing_mode, read_capacity, write_capacity) = if provisioned {
        (
            "PROVISIONED",
            Some(config.read_capacity.unwrap_or(DEFAULT_CAPACITY)),
            Some(config.write_capacity.unwrap_or(DEFAULT_CAPACITY)),
        )
    } else {
        ("PAY_PER_REQUEST", None, None)
    };

    let name = ctx.name(&config.table_name, NameKind::Table);
    let handle = ctx.declare(
        ResourceKind::Table,
        &name,
        json!({
            "table_name": name,
            "partition_key": partition(&config.partition_key),
            "sort_key": sort_key,
            "billing_mode": billing_mode,
            "read_capacity": read_capacity,
            "write_capacity": write_capacity,
            "stream": stream_view,
            "time_to_live_attribute": config.ttl_attribute,
            "global_secondary_indexes": global_indexes,
            "local_secondary_indexes": local_indexes,
        }),
    )?;

    let (stream_function, stream_mapping) = match &config.stream {
        Some(StreamConfig {
            enabled: true,
            function: Some(function),
        }) => {
            let function = build_function(ctx, function)?;
            let mapping = subscribe_to_stream(ctx, &function.handle, &handle)?;
            (Some(function), Some(mapping))
        }
        _ => (None, None),
    };

    Ok(TableResource {
        handle,
        stream_function,
        stream_mapping,
    })
}
