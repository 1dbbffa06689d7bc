//! Storage buckets

use serde::Deserialize;
use serde_json::json;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use crate::context::Context;
use crate::error::{RecipeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct BucketConfig {
    pub bucket_name: String,
    pub cors: Option<CorsConfig>,
    pub versioned: bool,
    pub public_read_access: bool,
    pub website: Option<WebsiteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_methods: Vec<String>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsiteConfig {
    pub index: String,
    pub error: String,
}

/// Methods a bucket CORS rule may allow
const CORS_METHODS: [&str; 5] = ["GET", "PUT", "HEAD", "POST", "DELETE"];

fn cors_method(method: &str) -> Result<&'static str> {
    CORS_METHODS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(method))
        .copied()
        .ok_or_else(|| RecipeError::unsupported("cors.allowed_methods", method))
}

pub fn build_bucket(ctx: &mut Context<'_>, config: &BucketConfig) -> Result<ResourceHandle> {
    let cors = match &config.cors {
        Some(cors) => {
            let methods = cors
                .allowed_methods
                .iter()
                .map(|m| cors_method(m))
                .collect::<Result<Vec<_>>>()?;
            Some(json!([{
                "allowed_methods": methods,
                "allowed_origins": cors.allowed_origins,
            }]))
        }
        None => None,
    };

    let website = config.website.as_ref().map(|site| {
        json!({
            "index_document": site.index,
            "error_document": site.error,
        })
    });

    let name = ctx.name(&config.bucket_name, NameKind::Bucket);
    Ok(ctx.declare(
        ResourceKind::Bucket,
        &name,
        json!({
            "bucket_name": name,
            "versioned": config.versioned,
            "public_read_access": config.public_read_access,
            "cors": cors,
            "website": website,
        }),
    )?)
}

pub fn build_buckets(ctx: &mut Context<'_>, configs: &[BucketConfig]) -> Result<Vec<ResourceHandle>> {
    configs.iter().map(|config| build_bucket(ctx, config)).collect()
}
