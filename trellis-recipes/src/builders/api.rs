//! REST APIs
//!
//! An API is declared with a default handler integration. Resources, methods,
//! preflight methods and the token authorizer hang off it as separate
//! resources so they can be depended on individually.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use super::function::{AuthorizerConfig, FunctionConfig};
use crate::context::Context;
use crate::error::{RecipeError, Result};

/// Methods an API resource may expose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Any,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Any => "ANY",
        }
    }

    /// Parses every method of a list, failing on the first unknown one
    pub fn parse_all(methods: &[String]) -> Result<Vec<HttpMethod>> {
        methods.iter().map(|m| m.parse()).collect()
    }
}

impl FromStr for HttpMethod {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "ANY" => Ok(HttpMethod::Any),
            _ => Err(RecipeError::unsupported("http method", s)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage logging level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingLevel {
    Off,
    Error,
    Info,
}

impl LoggingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggingLevel::Off => "OFF",
            LoggingLevel::Error => "ERROR",
            LoggingLevel::Info => "INFO",
        }
    }
}

impl FromStr for LoggingLevel {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OFF" => Ok(LoggingLevel::Off),
            "ERROR" => Ok(LoggingLevel::Error),
            "INFO" => Ok(LoggingLevel::Info),
            _ => Err(RecipeError::unsupported(
                "settings.default_stage_options.logging_level",
                s,
            )),
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RestApiConfig {
    pub apigateway_name: String,
    pub apigateway_description: Option<String>,
    pub authorizer_function: Option<AuthorizerConfig>,
    pub settings: ApiSettings,
    pub resource: Option<ApiResourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub proxy: bool,
    pub custom_domain: Option<CustomDomainConfig>,
    pub default_cors_options: Option<CorsOptions>,
    #[serde(default)]
    pub default_http_methods: Vec<String>,
    pub default_handler: FunctionConfig,
    #[serde(default)]
    pub default_media_types: Vec<String>,
    pub default_stage_options: Option<StageOptions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomDomainConfig {
    pub domain_name: String,
    pub certificate_arn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsOptions {
    pub allow_origins: Vec<String>,
    pub options_status_code: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageOptions {
    pub metrics_enabled: bool,
    pub logging_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResourceConfig {
    pub resource_name: String,
    #[serde(default)]
    pub methods: Vec<String>,
    /// Falls back to the default handler
    pub handler: Option<FunctionConfig>,
}

// =============================================================================
// Builders
// =============================================================================

/// Declares the API itself, integrated with `handler`
///
/// # Errors
/// `UnsupportedEnumValue` for an unknown stage logging level, before the API
/// is declared
pub fn build_rest_api(
    ctx: &mut Context<'_>,
    config: &RestApiConfig,
    handler: &ResourceHandle,
) -> Result<ResourceHandle> {
    let settings = &config.settings;
    let deploy_options = match &settings.default_stage_options {
        Some(stage) => {
            let level: LoggingLevel = stage.logging_level.parse()?;
            Some(json!({
                "metrics_enabled": stage.metrics_enabled,
                "logging_level": level.as_str(),
            }))
        }
        None => None,
    };

    let cors = settings.default_cors_options.as_ref().map(|cors| {
        json!({
            "allow_origins": cors.allow_origins,
            "status_code": cors.options_status_code,
        })
    });
    let domain = settings.custom_domain.as_ref().map(|domain| {
        json!({
            "domain_name": domain.domain_name,
            "certificate_arn": domain.certificate_arn,
        })
    });

    let name = ctx.name(&config.apigateway_name, NameKind::RestApi);
    let api = ctx.declare(
        ResourceKind::RestApi,
        &name,
        json!({
            "rest_api_name": name,
            "description": config.apigateway_description,
            "handler": handler.arn,
            "proxy": settings.proxy,
            "binary_media_types": settings.default_media_types,
            "default_cors_preflight_options": cors,
            "deploy_options": deploy_options,
            "domain_name": domain,
            "cloud_watch_role": true,
        }),
    )?;
    ctx.depend(&api, handler)?;
    Ok(api)
}

/// Declares a token authorizer named `{api base name}_authorizer`
pub fn build_token_authorizer(
    ctx: &mut Context<'_>,
    api_base_name: &str,
    api: &ResourceHandle,
    function: &ResourceHandle,
) -> Result<ResourceHandle> {
    let name = format!("{}_authorizer", api_base_name);
    let authorizer = ctx.declare(
        ResourceKind::ApiAuthorizer,
        &name,
        json!({
            "authorizer_name": name,
            "type": "TOKEN",
            "rest_api_id": api.attribute("Id"),
            "handler": function.arn,
            "identity_source": "method.request.header.Authorization",
        }),
    )?;
    ctx.depend(&authorizer, api)?;
    ctx.depend(&authorizer, function)?;
    Ok(authorizer)
}

/// Declares the default 4XX and 5XX responses
pub fn add_gateway_responses(
    ctx: &mut Context<'_>,
    api: &ResourceHandle,
) -> Result<Vec<ResourceHandle>> {
    let mut responses = Vec::with_capacity(2);
    for status_class in ["4XX", "5XX"] {
        let name = ctx.scope().gateway_response_name(status_class);
        let response = ctx.declare(
            ResourceKind::GatewayResponse,
            &name,
            json!({
                "rest_api_id": api.attribute("Id"),
                "response_type": format!("DEFAULT_{}", status_class),
                "response_headers": { "Access-Control-Allow-Origin": "'*'" },
            }),
        )?;
        ctx.depend(&response, api)?;
        responses.push(response);
    }
    Ok(responses)
}

/// Adds a path resource under the API root
///
/// The resource is named `{api}_resource_{path_part}`, so its methods never
/// share a name with the methods and preflight of the root.
pub fn add_resource(
    ctx: &mut Context<'_>,
    api: &ResourceHandle,
    path_part: &str,
) -> Result<ResourceHandle> {
    let name = format!("{}_resource_{}", api.name, path_part);
    let resource = ctx.declare(
        ResourceKind::ApiResource,
        &name,
        json!({
            "rest_api_id": api.attribute("Id"),
            "parent_id": api.attribute("RootResourceId"),
            "path_part": path_part,
        }),
    )?;
    ctx.depend(&resource, api)?;
    Ok(resource)
}

fn resource_id(api: &ResourceHandle, owner: &ResourceHandle) -> String {
    if owner.id == api.id {
        api.attribute("RootResourceId")
    } else {
        owner.attribute("ResourceId")
    }
}

/// Adds `method` to `owner` (the API root or a resource), integrated with
/// `integration` and guarded by `authorizer` when given
pub fn add_method(
    ctx: &mut Context<'_>,
    api: &ResourceHandle,
    owner: &ResourceHandle,
    method: HttpMethod,
    integration: &ResourceHandle,
    authorizer: Option<&ResourceHandle>,
) -> Result<ResourceHandle> {
    let name = format!("{}_{}", owner.name, method);
    let handle = ctx.declare(
        ResourceKind::ApiMethod,
        &name,
        json!({
            "http_method": method.as_str(),
            "rest_api_id": api.attribute("Id"),
            "resource_id": resource_id(api, owner),
            "integration": { "type": "AWS_PROXY", "uri": integration.arn },
            "authorization_type": if authorizer.is_some() { "CUSTOM" } else { "NONE" },
            "authorizer_id": authorizer.map(|a| a.attribute("AuthorizerId")),
        }),
    )?;
    ctx.depend(&handle, owner)?;
    ctx.depend(&handle, integration)?;
    if let Some(authorizer) = authorizer {
        ctx.depend(&handle, authorizer)?;
    }
    Ok(handle)
}

/// Adds an `OPTIONS` method answering CORS preflight requests for `owner`
///
/// An empty `methods` list allows every method.
pub fn add_cors_preflight(
    ctx: &mut Context<'_>,
    api: &ResourceHandle,
    owner: &ResourceHandle,
    cors: &CorsOptions,
    methods: &[HttpMethod],
) -> Result<ResourceHandle> {
    let allow_methods: Vec<&str> = if methods.is_empty() {
        vec![HttpMethod::Any.as_str()]
    } else {
        methods.iter().map(HttpMethod::as_str).collect()
    };

    let name = format!("{}_preflight", owner.name);
    let handle = ctx.declare(
        ResourceKind::ApiMethod,
        &name,
        json!({
            "http_method": HttpMethod::Options.as_str(),
            "rest_api_id": api.attribute("Id"),
            "resource_id": resource_id(api, owner),
            "integration": { "type": "MOCK" },
            "authorization_type": "NONE",
            "status_code": cors.options_status_code,
            "allow_origins": cors.allow_origins,
            "allow_methods": allow_methods,
        }),
    )?;
    ctx.depend(&handle, owner)?;
    Ok(handle)
}
