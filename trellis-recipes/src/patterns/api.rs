//! REST API backed by functions
//!
//! The API integrates a default handler, optionally guarded by a token
//! authorizer. A single extra path resource and a list of fan-out functions
//! the handler may invoke can be added around it.

use serde::Deserialize;
use serde_json::Value;
use trellis_core::domain::resource::ResourceHandle;
use trellis_schema::{PatternKind, extract};

use super::{AlarmTarget, Pattern, function_alarm_targets, function_handles};
use crate::builders::api::{
    HttpMethod, LoggingLevel, RestApiConfig, add_cors_preflight, add_gateway_responses,
    add_method, add_resource, build_rest_api, build_token_authorizer,
};
use crate::builders::bucket::{BucketConfig, build_buckets};
use crate::builders::function::{
    FunctionConfig, FunctionResource, ResolvedFunction, build_function, build_functions,
    resolve_authorizer,
};
use crate::builders::subscription::grant_invoke;
use crate::context::Context;
use crate::error::{RecipeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct RestApiServiceConfig {
    #[serde(default)]
    pub buckets: Vec<BucketConfig>,
    /// Functions the default handler may invoke
    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
    pub api: RestApiConfig,
}

/// The extra path resource and what hangs off it
#[derive(Debug, Clone)]
pub struct ApiPath {
    pub resource: ResourceHandle,
    /// Dedicated handler, when one is configured
    pub handler: Option<FunctionResource>,
    pub methods: Vec<ResourceHandle>,
}

/// REST API with a default handler, an optional authorizer, an optional
/// path resource and fan-out functions
#[derive(Debug, Clone)]
pub struct RestApiService {
    configuration: RestApiServiceConfig,
    buckets: Vec<ResourceHandle>,
    authorizer_function: Option<ResolvedFunction>,
    handler: FunctionResource,
    api: ResourceHandle,
    authorizer: Option<ResourceHandle>,
    gateway_responses: Vec<ResourceHandle>,
    root_methods: Vec<ResourceHandle>,
    path: Option<ApiPath>,
    functions: Vec<FunctionResource>,
    permissions: Vec<ResourceHandle>,
}

impl RestApiService {
    pub fn configuration(&self) -> &RestApiServiceConfig {
        &self.configuration
    }

    pub fn buckets(&self) -> &[ResourceHandle] {
        &self.buckets
    }

    pub fn authorizer_function(&self) -> Option<&ResolvedFunction> {
        self.authorizer_function.as_ref()
    }

    /// Default handler
    pub fn handler(&self) -> &FunctionResource {
        &self.handler
    }

    pub fn api(&self) -> &ResourceHandle {
        &self.api
    }

    pub fn authorizer(&self) -> Option<&ResourceHandle> {
        self.authorizer.as_ref()
    }

    pub fn gateway_responses(&self) -> &[ResourceHandle] {
        &self.gateway_responses
    }

    /// Methods and preflight declared on the API root
    pub fn root_methods(&self) -> &[ResourceHandle] {
        &self.root_methods
    }

    pub fn path(&self) -> Option<&ApiPath> {
        self.path.as_ref()
    }

    pub fn functions(&self) -> &[FunctionResource] {
        &self.functions
    }

    /// Invoke permissions granted to the API
    pub fn permissions(&self) -> &[ResourceHandle] {
        &self.permissions
    }
}

/// Checks everything that can be rejected before a single resource exists
fn preflight_checks(config: &RestApiConfig) -> Result<(Vec<HttpMethod>, Vec<HttpMethod>)> {
    let settings = &config.settings;
    if !settings.proxy && settings.default_http_methods.is_empty() {
        return Err(RecipeError::missing(
            "api.settings.default_http_methods (required unless proxy is true)",
        ));
    }
    if let Some(authorizer) = &config.authorizer_function {
        authorizer.ensure_present()?;
    }
    if let Some(stage) = &settings.default_stage_options {
        stage.logging_level.parse::<LoggingLevel>()?;
    }

    let root_methods = HttpMethod::parse_all(&settings.default_http_methods)?;
    let path_methods = match &config.resource {
        Some(resource) => HttpMethod::parse_all(&resource.methods)?,
        None => Vec::new(),
    };
    Ok((root_methods, path_methods))
}

impl Pattern for RestApiService {
    const KIND: PatternKind = PatternKind::RestApiService;

    fn build(ctx: &mut Context<'_>, configuration: &Value) -> Result<Self> {
        let configuration: RestApiServiceConfig = extract(configuration, "")?;
        let api_config = &configuration.api;
        let (root_method_kinds, path_method_kinds) = preflight_checks(api_config)?;
        let cors = api_config.settings.default_cors_options.as_ref();

        let buckets = build_buckets(ctx, &configuration.buckets)?;

        let authorizer_function = match &api_config.authorizer_function {
            Some(config) => Some(resolve_authorizer(ctx, config)?),
            None => None,
        };

        let handler = build_function(ctx, &api_config.settings.default_handler)?;
        let api = build_rest_api(ctx, api_config, &handler.handle)?;
        let mut permissions = vec![grant_invoke(ctx, &handler.handle, "apigateway", Some(&api))?];

        let authorizer = match &authorizer_function {
            Some(function) => {
                let authorizer =
                    build_token_authorizer(ctx, &api_config.apigateway_name, &api, function.handle())?;
                permissions.push(grant_invoke(ctx, function.handle(), "apigateway", Some(&api))?);
                Some(authorizer)
            }
            None => None,
        };

        let gateway_responses = add_gateway_responses(ctx, &api)?;

        let mut root_methods = Vec::with_capacity(root_method_kinds.len() + 1);
        for method in &root_method_kinds {
            root_methods.push(add_method(
                ctx,
                &api,
                &api,
                *method,
                &handler.handle,
                authorizer.as_ref(),
            )?);
        }
        if let Some(cors) = cors {
            root_methods.push(add_cors_preflight(ctx, &api, &api, cors, &root_method_kinds)?);
        }

        let path = match &api_config.resource {
            Some(resource_config) => {
                let resource = add_resource(ctx, &api, &resource_config.resource_name)?;
                let path_handler = match &resource_config.handler {
                    Some(config) => {
                        let function = build_function(ctx, config)?;
                        permissions.push(grant_invoke(
                            ctx,
                            &function.handle,
                            "apigateway",
                            Some(&api),
                        )?);
                        Some(function)
                    }
                    None => None,
                };
                let integration = path_handler.as_ref().unwrap_or(&handler);

                let mut methods = Vec::with_capacity(path_method_kinds.len() + 1);
                for method in &path_method_kinds {
                    methods.push(add_method(
                        ctx,
                        &api,
                        &resource,
                        *method,
                        &integration.handle,
                        authorizer.as_ref(),
                    )?);
                }
                if let Some(cors) = cors {
                    methods.push(add_cors_preflight(ctx, &api, &resource, cors, &path_method_kinds)?);
                }

                Some(ApiPath {
                    resource,
                    handler: path_handler,
                    methods,
                })
            }
            None => None,
        };

        let functions = build_functions(ctx, &configuration.functions)?;
        let invoke = vec!["lambda:InvokeFunction".to_string()];
        for function in &functions {
            ctx.grant(&handler.handle, &invoke, &[function.handle.arn.clone()])?;
        }

        Ok(Self {
            configuration,
            buckets,
            authorizer_function,
            handler,
            api,
            authorizer,
            gateway_responses,
            root_methods,
            path,
            functions,
            permissions,
        })
    }

    fn resources(&self) -> Vec<&ResourceHandle> {
        let mut resources: Vec<&ResourceHandle> = self.buckets.iter().collect();
        match &self.authorizer_function {
            Some(ResolvedFunction::Origin(function)) => resources.extend(function_handles(function)),
            Some(ResolvedFunction::Imported(handle)) => resources.push(handle),
            None => {}
        }
        resources.extend(function_handles(&self.handler));
        resources.push(&self.api);
        resources.extend(&self.authorizer);
        resources.extend(&self.gateway_responses);
        resources.extend(&self.root_methods);
        if let Some(path) = &self.path {
            resources.push(&path.resource);
            if let Some(handler) = &path.handler {
                resources.extend(function_handles(handler));
            }
            resources.extend(&path.methods);
        }
        resources.extend(self.functions.iter().flat_map(function_handles));
        resources.extend(&self.permissions);
        resources
    }

    fn alarm_targets(&self) -> Vec<AlarmTarget<'_>> {
        let api = &self.configuration.api;
        let mut targets: Vec<AlarmTarget<'_>> = Vec::new();
        if let (Some(ResolvedFunction::Origin(function)), Some(config)) = (
            &self.authorizer_function,
            api.authorizer_function.as_ref().and_then(|a| a.origin.as_ref()),
        ) {
            targets.extend(function_alarm_targets(
                std::slice::from_ref(function),
                std::slice::from_ref(config),
            ));
        }
        targets.extend(function_alarm_targets(
            std::slice::from_ref(&self.handler),
            std::slice::from_ref(&api.settings.default_handler),
        ));
        if let (Some(handler), Some(config)) = (
            self.path.as_ref().and_then(|p| p.handler.as_ref()),
            api.resource.as_ref().and_then(|r| r.handler.as_ref()),
        ) {
            targets.extend(function_alarm_targets(
                std::slice::from_ref(handler),
                std::slice::from_ref(config),
            ));
        }
        targets.extend(function_alarm_targets(
            &self.functions,
            &self.configuration.functions,
        ));
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;
    use trellis_core::domain::resource::ResourceKind;

    fn service(settings: Value) -> Value {
        json!({
            "api": {
                "apigateway_name": "store",
                "settings": settings
            }
        })
    }

    #[test]
    fn test_proxy_api() {
        let mut stack = testing::stack();
        let config = service(json!({
            "proxy": true,
            "default_handler": testing::function("handler")
        }));

        let api: RestApiService = stack.compose(&config).unwrap();

        assert_eq!(api.api().name, "acme_store_dev");
        assert!(api.authorizer().is_none());
        assert!(api.root_methods().is_empty());
        assert_eq!(api.gateway_responses().len(), 2);
        assert_eq!(api.permissions().len(), 1);
        assert_eq!(stack.graph().len(), api.resources().len());
    }

    #[test]
    fn test_non_proxy_requires_methods() {
        let mut stack = testing::stack();
        let config = json!({
            "buckets": [{ "bucket_name": "assets", "versioned": false, "public_read_access": false }],
            "api": {
                "apigateway_name": "store",
                "settings": {
                    "proxy": false,
                    "default_http_methods": [],
                    "default_handler": testing::function("handler")
                }
            }
        });

        let result = stack.compose::<RestApiService>(&config);

        assert!(matches!(result, Err(RecipeError::MissingRequiredSubResource(_))));
        assert!(stack.graph().is_empty());
    }

    #[test]
    fn test_empty_authorizer_rejected_before_declaring() {
        let mut stack = testing::stack();
        let mut config = service(json!({
            "proxy": true,
            "default_handler": testing::function("handler")
        }));
        config["api"]["authorizer_function"] = json!({});

        let result = stack.compose::<RestApiService>(&config);

        assert!(matches!(result, Err(RecipeError::MissingRequiredSubResource(_))));
        assert!(stack.graph().is_empty());
    }

    #[test]
    fn test_unknown_method_rejected_before_declaring() {
        let mut stack = testing::stack();
        let config = service(json!({
            "proxy": false,
            "default_http_methods": ["GET", "FETCH"],
            "default_handler": testing::function("handler")
        }));

        let result = stack.compose::<RestApiService>(&config);

        assert!(matches!(result, Err(RecipeError::UnsupportedEnumValue { .. })));
        assert!(stack.graph().is_empty());
    }

    #[test]
    fn test_full_service() {
        let mut stack = testing::stack();
        let config = json!({
            "functions": [testing::function("fulfil")],
            "api": {
                "apigateway_name": "store",
                "authorizer_function": { "origin": testing::function("authorize") },
                "settings": {
                    "proxy": false,
                    "default_http_methods": ["GET", "POST"],
                    "default_handler": testing::function("handler"),
                    "default_cors_options": { "allow_origins": ["*"], "options_status_code": 200 }
                },
                "resource": {
                    "resource_name": "orders",
                    "methods": ["GET"],
                    "handler": testing::function("orders")
                }
            }
        });

        let api: RestApiService = stack.compose(&config).unwrap();

        let graph = stack.graph();
        let authorizer = api.authorizer().unwrap();
        assert_eq!(authorizer.name, "store_authorizer");
        assert!(api.authorizer_function().unwrap().origin().is_some());

        let methods: Vec<_> = api.root_methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            methods,
            vec!["acme_store_dev_GET", "acme_store_dev_POST", "acme_store_dev_preflight"]
        );
        let get = graph.get(api.root_methods()[0].id).unwrap();
        assert_eq!(get.property_str("authorization_type"), Some("CUSTOM"));

        let path = api.path().unwrap();
        let orders = path.handler.as_ref().unwrap();
        let orders_get = graph.get(path.methods[0].id).unwrap();
        assert_eq!(orders_get.properties["integration"]["uri"], orders.handle.arn);
        assert_eq!(path.methods.len(), 2);

        let fulfil = &api.functions()[0];
        let handler_policies = graph.policies_of(api.handler().handle.id);
        assert_eq!(
            handler_policies.last().unwrap().resources,
            vec![fulfil.handle.arn.clone()]
        );
        assert!(fulfil.handle.id > path.resource.id);
        assert_eq!(api.permissions().len(), 3);
        assert_eq!(graph.of_kind(ResourceKind::ApiMethod).count(), 5);
        assert_eq!(graph.len(), api.resources().len());
    }

    #[test]
    fn test_preflight_path_with_cors() {
        let mut stack = testing::stack();
        let mut config = service(json!({
            "proxy": false,
            "default_http_methods": ["GET"],
            "default_handler": testing::function("handler"),
            "default_cors_options": { "allow_origins": ["*"], "options_status_code": 204 }
        }));
        config["api"]["resource"] = json!({ "resource_name": "preflight", "methods": ["POST"] });

        let api: RestApiService = stack.compose(&config).unwrap();

        let path = api.path().unwrap();
        assert_eq!(path.resource.name, "acme_store_dev_resource_preflight");
        let names: Vec<_> = path.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "acme_store_dev_resource_preflight_POST",
                "acme_store_dev_resource_preflight_preflight"
            ]
        );
        assert_eq!(stack.graph().len(), api.resources().len());
    }

    #[test]
    fn test_imported_authorizer_not_built() {
        let mut stack = testing::stack();
        let mut config = service(json!({
            "proxy": true,
            "default_handler": testing::function("handler")
        }));
        config["api"]["authorizer_function"] = json!({
            "origin": testing::function("authorize"),
            "imported": {
                "arn": "arn:aws:lambda:us-east-1:123456789012:function:shared-auth",
                "identifier": "shared_auth"
            }
        });

        let api: RestApiService = stack.compose(&config).unwrap();

        assert!(stack.graph().find("acme_authorize_dev").is_none());
        assert_eq!(
            api.authorizer_function().unwrap().handle().kind,
            ResourceKind::ImportedFunction
        );
        assert!(api.alarm_targets().iter().all(|t| t.resource_name != "authorize"));
    }
}
