//! Resource domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared properties of a resource, always a JSON object
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Position of a resource in the graph it was declared in
///
/// Identifiers are assigned in creation order, so comparing two ids tells
/// which resource was declared first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Queue,
    Topic,
    Function,
    /// Function that already exists outside the deployment
    ImportedFunction,
    Role,
    IotRule,
    EventRule,
    EventSourceMapping,
    Subscription,
    Permission,
    AnalyticsChannel,
    AnalyticsDatastore,
    AnalyticsPipeline,
    AnalyticsDataset,
    Bucket,
    /// Event notification from a bucket to a function
    BucketNotification,
    /// IoT policy document attachable to device certificates
    IotPolicy,
    Table,
    UserPool,
    UserPoolClient,
    UserPoolGroup,
    RestApi,
    ApiResource,
    ApiMethod,
    ApiAuthorizer,
    GatewayResponse,
    Alarm,
}

impl ResourceKind {
    /// Returns the snake_case name used in manifests and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "queue",
            ResourceKind::Topic => "topic",
            ResourceKind::Function => "function",
            ResourceKind::ImportedFunction => "imported_function",
            ResourceKind::Role => "role",
            ResourceKind::IotRule => "iot_rule",
            ResourceKind::EventRule => "event_rule",
            ResourceKind::EventSourceMapping => "event_source_mapping",
            ResourceKind::Subscription => "subscription",
            ResourceKind::Permission => "permission",
            ResourceKind::AnalyticsChannel => "analytics_channel",
            ResourceKind::AnalyticsDatastore => "analytics_datastore",
            ResourceKind::AnalyticsPipeline => "analytics_pipeline",
            ResourceKind::AnalyticsDataset => "analytics_dataset",
            ResourceKind::Bucket => "bucket",
            ResourceKind::BucketNotification => "bucket_notification",
            ResourceKind::IotPolicy => "iot_policy",
            ResourceKind::Table => "table",
            ResourceKind::UserPool => "user_pool",
            ResourceKind::UserPoolClient => "user_pool_client",
            ResourceKind::UserPoolGroup => "user_pool_group",
            ResourceKind::RestApi => "rest_api",
            ResourceKind::ApiResource => "api_resource",
            ResourceKind::ApiMethod => "api_method",
            ResourceKind::ApiAuthorizer => "api_authorizer",
            ResourceKind::GatewayResponse => "gateway_response",
            ResourceKind::Alarm => "alarm",
        }
    }

    /// Reference kinds point at something that already exists; their ARN
    /// is supplied by the caller instead of being a graph token.
    pub fn is_reference(&self) -> bool {
        matches!(self, ResourceKind::ImportedFunction)
    }

    /// Whether IAM policy statements can be attached to this kind
    ///
    /// Functions accept statements on their execution role.
    pub fn accepts_policies(&self) -> bool {
        matches!(self, ResourceKind::Role | ResourceKind::Function)
    }

    /// Whether the kind is something that can be invoked as a function
    pub fn is_function(&self) -> bool {
        matches!(self, ResourceKind::Function | ResourceKind::ImportedFunction)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a declared resource
///
/// Handles are cheap to clone and are threaded from one builder into the
/// next so later resources can reference earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub id: ResourceId,
    pub kind: ResourceKind,
    /// Unique logical name within the deployment
    pub name: String,
    /// ARN, or an ARN token resolved at deploy time
    pub arn: String,
}

impl ResourceHandle {
    /// Token for an attribute of this resource, e.g. `${orders.Url}`
    pub fn attribute(&self, attribute: &str) -> String {
        format!("${{{}.{}}}", self.name, attribute)
    }

    /// Token for the resource URL (queues, APIs)
    pub fn url(&self) -> String {
        self.attribute("Url")
    }
}

/// A single IAM policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// Everything the graph knows about one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub handle: ResourceHandle,
    pub properties: Properties,
    pub policies: Vec<PolicyStatement>,
}

impl ResourceDescriptor {
    /// Reads a string property
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(serde_json::Value::as_str)
    }
}

/// `from` depends on `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: ResourceId,
    pub to: ResourceId,
}
