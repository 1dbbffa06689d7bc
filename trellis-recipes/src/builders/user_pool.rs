//! User pools, app clients and user pool groups

use serde::Deserialize;
use serde_json::{Map, Value, json};
use trellis_core::domain::naming::NameKind;
use trellis_core::domain::resource::{ResourceHandle, ResourceKind};

use super::function::{FunctionConfig, FunctionResource, build_function};
use super::role::build_service_role;
use super::subscription::grant_invoke;
use crate::context::Context;
use crate::error::{RecipeError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct UserPoolConfig {
    pub pool_name: String,
    pub email: Option<EmailConfig>,
    pub password_policy: PasswordPolicyConfig,
    pub sign_up: SignUpConfig,
    pub invitation: InvitationConfig,
    pub sign_in: SignInConfig,
    pub attributes: AttributesConfig,
    pub app_client: Option<AppClientConfig>,
    #[serde(default)]
    pub triggers: TriggersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordPolicyConfig {
    pub minimum_length: Option<u32>,
    /// Days
    pub temporary_password_duration: Option<u32>,
    pub require: Option<PasswordRequirements>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordRequirements {
    pub lower_case: Option<bool>,
    pub upper_case: Option<bool>,
    pub digits: Option<bool>,
    pub symbols: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpConfig {
    pub enabled: bool,
    pub user_verification: VerificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    pub email: Option<VerificationEmail>,
    pub sms: Option<SmsMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationEmail {
    pub subject: String,
    pub body: String,
    /// `code` or `link`
    pub style: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationConfig {
    pub email: Option<EmailMessage>,
    pub sms: Option<SmsMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsMessage {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInConfig {
    /// Aliases users may sign in with
    pub order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributesConfig {
    pub standard: Vec<StandardAttribute>,
    #[serde(default)]
    pub custom: Vec<CustomAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardAttribute {
    pub name: String,
    pub mutable: bool,
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    pub mutable: Option<bool>,
    pub minimum_length: Option<u32>,
    pub maximum_length: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppClientConfig {
    pub enabled: bool,
    pub client_name: String,
    pub generate_secret: bool,
    pub auth_flows: Option<AuthFlows>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthFlows {
    pub admin_user_password: Option<bool>,
    pub custom: Option<bool>,
    pub refresh_token: Option<bool>,
    pub user_password: Option<bool>,
    pub user_srp: Option<bool>,
}

/// Lifecycle trigger functions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggersConfig {
    pub create_auth_challenge: Option<FunctionConfig>,
    pub custom_message: Option<FunctionConfig>,
    pub define_auth_challenge: Option<FunctionConfig>,
    pub post_authentication: Option<FunctionConfig>,
    pub post_confirmation: Option<FunctionConfig>,
    pub pre_authentication: Option<FunctionConfig>,
    pub pre_sign_up: Option<FunctionConfig>,
    pub pre_token_generation: Option<FunctionConfig>,
    pub user_migration: Option<FunctionConfig>,
    pub verify_auth_challenge_response: Option<FunctionConfig>,
}

impl TriggersConfig {
    /// Configured triggers in a fixed order
    pub fn entries(&self) -> Vec<(&'static str, &FunctionConfig)> {
        [
            ("create_auth_challenge", &self.create_auth_challenge),
            ("custom_message", &self.custom_message),
            ("define_auth_challenge", &self.define_auth_challenge),
            ("post_authentication", &self.post_authentication),
            ("post_confirmation", &self.post_confirmation),
            ("pre_authentication", &self.pre_authentication),
            ("pre_sign_up", &self.pre_sign_up),
            ("pre_token_generation", &self.pre_token_generation),
            ("user_migration", &self.user_migration),
            ("verify_auth_challenge_response", &self.verify_auth_challenge_response),
        ]
        .into_iter()
        .filter_map(|(name, config)| config.as_ref().map(|c| (name, c)))
        .collect()
    }
}

/// A built user pool
#[derive(Debug, Clone)]
pub struct UserPoolResource {
    pub pool: ResourceHandle,
    pub client: Option<ResourceHandle>,
    /// Trigger name and the function handling it
    pub triggers: Vec<(String, FunctionResource)>,
    /// Invoke permissions for the trigger functions
    pub permissions: Vec<ResourceHandle>,
}

const STANDARD_ATTRIBUTES: [&str; 17] = [
    "address",
    "birthdate",
    "email",
    "family_name",
    "gender",
    "given_name",
    "locale",
    "middle_name",
    "name",
    "nickname",
    "phone_number",
    "picture",
    "preferred_username",
    "profile",
    "timezone",
    "updated_at",
    "website",
];

fn verification_style(style: &str) -> Result<&'static str> {
    match style.to_ascii_lowercase().as_str() {
        "code" => Ok("CODE"),
        "link" => Ok("LINK"),
        _ => Err(RecipeError::unsupported(
            "sign_up.user_verification.email.style",
            style,
        )),
    }
}

fn sign_in_aliases(order: &[String]) -> Result<Value> {
    let mut aliases = Map::new();
    for alias in order {
        let key = match alias.to_ascii_lowercase().as_str() {
            "username" => "username",
            "email" => "email",
            "phone" | "phone_number" => "phone",
            "preferred_username" => "preferred_username",
            _ => return Err(RecipeError::unsupported("sign_in.order", alias.as_str())),
        };
        aliases.insert(key.to_string(), Value::Bool(true));
    }
    Ok(Value::Object(aliases))
}

fn standard_attributes(attributes: &[StandardAttribute]) -> Result<Value> {
    let mut standard = Map::new();
    for attribute in attributes {
        if !STANDARD_ATTRIBUTES.contains(&attribute.name.as_str()) {
            return Err(RecipeError::unsupported(
                "attributes.standard.name",
                attribute.name.as_str(),
            ));
        }
        standard.insert(
            attribute.name.clone(),
            json!({ "mutable": attribute.mutable, "required": attribute.required }),
        );
    }
    Ok(Value::Object(standard))
}

fn custom_attributes(attributes: &[CustomAttribute]) -> Result<Value> {
    let mut custom = Map::new();
    for attribute in attributes {
        let kind = match attribute.attribute_type.to_ascii_lowercase().as_str() {
            "string" => "String",
            "number" => "Number",
            "bool" | "boolean" => "Boolean",
            "date" | "datetime" => "DateTime",
            _ => {
                return Err(RecipeError::unsupported(
                    "attributes.custom.type",
                    attribute.attribute_type.as_str(),
                ));
            }
        };
        custom.insert(
            attribute.name.clone(),
            json!({
                "type": kind,
                "mutable": attribute.mutable.unwrap_or(true),
                "min_len": attribute.minimum_length,
                "max_len": attribute.maximum_length,
            }),
        );
    }
    Ok(Value::Object(custom))
}

/// Builds a user pool, its trigger functions and its app client
///
/// Enum-like values are checked first. Trigger functions are built before
/// the pool; each gets an invoke permission scoped to the pool.
pub fn build_user_pool(ctx: &mut Context<'_>, config: &UserPoolConfig) -> Result<UserPoolResource> {
    let email_verification = config
        .sign_up
        .user_verification
        .email
        .as_ref()
        .map(|email| -> Result<Value> {
            Ok(json!({
                "subject": email.subject,
                "body": email.body,
                "style": verification_style(&email.style)?,
            }))
        })
        .transpose()?;
    let aliases = sign_in_aliases(&config.sign_in.order)?;
    let standard = standard_attributes(&config.attributes.standard)?;
    let custom = custom_attributes(&config.attributes.custom)?;

    let mut triggers = Vec::new();
    for (trigger, function) in config.triggers.entries() {
        triggers.push((trigger.to_string(), build_function(ctx, function)?));
    }

    let lambda_triggers: Map<String, Value> = triggers
        .iter()
        .map(|(trigger, function)| (trigger.clone(), Value::String(function.handle.arn.clone())))
        .collect();

    let require = config.password_policy.require.clone().unwrap_or_default();
    let name = ctx.name(&config.pool_name, NameKind::UserPool);
    let pool = ctx.declare(
        ResourceKind::UserPool,
        &name,
        json!({
            "user_pool_name": name,
            "email": config.email.as_ref().map(|e| json!({ "from": e.from, "reply_to": e.reply_to })),
            "password_policy": {
                "min_length": config.password_policy.minimum_length,
                "temp_password_validity_days": config.password_policy.temporary_password_duration,
                "require_lowercase": require.lower_case.unwrap_or(false),
                "require_uppercase": require.upper_case.unwrap_or(false),
                "require_digits": require.digits.unwrap_or(false),
                "require_symbols": require.symbols.unwrap_or(false),
            },
            "self_sign_up_enabled": config.sign_up.enabled,
            "user_verification": {
                "email": email_verification,
                "sms_message": config.sign_up.user_verification.sms.as_ref().map(|s| &s.body),
            },
            "user_invitation": {
                "email_subject": config.invitation.email.as_ref().map(|e| &e.subject),
                "email_body": config.invitation.email.as_ref().map(|e| &e.body),
                "sms_message": config.invitation.sms.as_ref().map(|s| &s.body),
            },
            "sign_in_aliases": aliases,
            "standard_attributes": standard,
            "custom_attributes": custom,
            "lambda_triggers": lambda_triggers,
        }),
    )?;

    let mut permissions = Vec::with_capacity(triggers.len());
    for (_, function) in &triggers {
        ctx.depend(&pool, &function.handle)?;
        permissions.push(grant_invoke(ctx, &function.handle, "cognito-idp", Some(&pool))?);
    }

    let client = match &config.app_client {
        Some(app_client) if app_client.enabled => Some(build_app_client(ctx, &pool, app_client)?),
        _ => None,
    };

    Ok(UserPoolResource {
        pool,
        client,
        triggers,
        permissions,
    })
}

fn build_app_client(
    ctx: &mut Context<'_>,
    pool: &ResourceHandle,
    config: &AppClientConfig,
) -> Result<ResourceHandle> {
    let flows = config.auth_flows.clone().unwrap_or_default();
    let name = ctx.name(&config.client_name, NameKind::UserPoolClient);
    let client = ctx.declare(
        ResourceKind::UserPoolClient,
        &name,
        json!({
            "user_pool_client_name": name,
            "user_pool_id": pool.attribute("Id"),
            "generate_secret": config.generate_secret,
            "auth_flows": {
                "admin_user_password": flows.admin_user_password.unwrap_or(false),
                "custom": flows.custom.unwrap_or(false),
                "refresh_token": flows.refresh_token.unwrap_or(false),
                "user_password": flows.user_password.unwrap_or(false),
                "user_srp": flows.user_srp.unwrap_or(false),
            },
        }),
    )?;
    ctx.depend(&client, pool)?;
    Ok(client)
}

// =============================================================================
// Groups
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserPoolGroupConfig {
    pub group_name: String,
    pub description: Option<String>,
    pub pool_id: String,
    pub precedence: u32,
    pub role: GroupRoleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupRoleConfig {
    pub name: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
    pub principal: String,
}

/// A user pool group and the role its members assume
#[derive(Debug, Clone)]
pub struct UserPoolGroupResource {
    pub role: ResourceHandle,
    pub group: ResourceHandle,
}

pub fn build_user_pool_group(
    ctx: &mut Context<'_>,
    config: &UserPoolGroupConfig,
) -> Result<UserPoolGroupResource> {
    let role = build_service_role(
        ctx,
        &config.role.name,
        &config.role.principal,
        &config.role.actions,
        &config.role.resources,
    )?;

    let name = ctx.name(&config.group_name, NameKind::UserPoolGroup);
    let group = ctx.declare(
        ResourceKind::UserPoolGroup,
        &name,
        json!({
            "group_name": name,
            "description": config.description,
            "user_pool_id": config.pool_id,
            "precedence": config.precedence,
            "role_arn": role.arn,
        }),
    )?;
    ctx.depend(&group, &role)?;

    Ok(UserPoolGroupResource { role, group })
}
