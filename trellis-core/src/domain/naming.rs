//! Deterministic resource naming
//!
//! Every physical name in a deployment is derived from the same three
//! inputs: a prefix, an environment, and the base name the configuration
//! gives a resource. Names are pure functions of those inputs plus the
//! resource kind, so re-running a composition always yields the same names.

use serde::{Deserialize, Serialize};

/// Naming scope shared by all resources of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub prefix: String,
    pub environment: String,
}

/// Layout selector for [`Scope::resource_name`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKind {
    Queue,
    Topic,
    Function,
    Role,
    Policy,
    IotRule,
    IotPolicy,
    /// Scheduled rule declared by a pattern
    EventRule,
    /// Scheduled rule that keeps a function warm
    KeepWarmRule,
    Channel,
    Datastore,
    Pipeline,
    Dataset,
    Table,
    UserPool,
    UserPoolClient,
    UserPoolGroup,
    RestApi,
    Bucket,
}

impl Scope {
    pub fn new(prefix: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            environment: environment.into(),
        }
    }

    /// Derives the physical name of a resource
    ///
    /// # Arguments
    /// * `base` - Base name taken from the configuration
    /// * `kind` - Which naming layout applies
    ///
    /// # Returns
    /// The scoped name. Analytics names never contain `-` and bucket names
    /// never contain `_`, since the backing services reject them.
    pub fn resource_name(&self, base: &str, kind: NameKind) -> String {
        let p = &self.prefix;
        let e = &self.environment;
        match kind {
            NameKind::Queue => format!("{p}_{base}_queue_{e}"),
            NameKind::Topic => format!("{p}_{base}_topic_{e}"),
            NameKind::Function
            | NameKind::IotRule
            | NameKind::IotPolicy
            | NameKind::EventRule
            | NameKind::RestApi => format!("{p}_{base}_{e}"),
            NameKind::KeepWarmRule => format!("{p}_{base}_rule_{e}"),
            NameKind::Role => format!("{p}_role_{base}_{e}"),
            NameKind::Policy => format!("{p}_policy_{base}_{e}"),
            NameKind::Channel => format!("{p}_{base}_channel_{e}").replace('-', "_"),
            NameKind::Datastore => format!("{p}_{base}_datastore_{e}").replace('-', "_"),
            NameKind::Pipeline => format!("{p}_{base}_pipeline_{e}").replace('-', "_"),
            NameKind::Dataset => base.replace('-', "_"),
            NameKind::Table => format!("{p}_{base}_table_{e}"),
            NameKind::UserPool => format!("{p}_{base}_pool_{e}"),
            NameKind::UserPoolClient => format!("{p}_{base}_client_{e}"),
            NameKind::UserPoolGroup => format!("{p}_{base}_group_{e}"),
            NameKind::Bucket => format!("{p}-{base}-bucket-{e}").replace('_', "-"),
        }
    }

    /// Name of an alarm on `metric` of the resource configured as `resource`
    pub fn alarm_name(&self, resource: &str, metric: &str) -> String {
        format!("{}_{}_{}_{}", self.prefix, resource, metric, self.environment)
    }

    /// Name of an API gateway response for a status class such as `4XX`
    pub fn gateway_response_name(&self, status_class: &str) -> String {
        format!("{}_{}response_{}", self.prefix, status_class, self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("acme", "dev")
    }

    #[test]
    fn test_messaging_names() {
        let scope = scope();
        assert_eq!(scope.resource_name("orders", NameKind::Queue), "acme_orders_queue_dev");
        assert_eq!(scope.resource_name("orders", NameKind::Topic), "acme_orders_topic_dev");
        assert_eq!(scope.resource_name("process", NameKind::Function), "acme_process_dev");
        assert_eq!(scope.resource_name("ingest", NameKind::IotRule), "acme_ingest_dev");
        assert_eq!(scope.resource_name("devices", NameKind::IotPolicy), "acme_devices_dev");
        assert_eq!(scope.resource_name("process", NameKind::KeepWarmRule), "acme_process_rule_dev");
    }

    #[test]
    fn test_role_names_put_kind_before_base() {
        let scope = scope();
        assert_eq!(scope.resource_name("orders", NameKind::Role), "acme_role_orders_dev");
        assert_eq!(scope.resource_name("orders", NameKind::Policy), "acme_policy_orders_dev");
    }

    #[test]
    fn test_analytics_names_replace_hyphens() {
        let scope = Scope::new("acme-iot", "dev");
        assert_eq!(
            scope.resource_name("raw-data", NameKind::Channel),
            "acme_iot_raw_data_channel_dev"
        );
        assert_eq!(
            scope.resource_name("raw-data", NameKind::Datastore),
            "acme_iot_raw_data_datastore_dev"
        );
        assert_eq!(
            scope.resource_name("raw-data", NameKind::Pipeline),
            "acme_iot_raw_data_pipeline_dev"
        );
        assert_eq!(scope.resource_name("daily-report", NameKind::Dataset), "daily_report");
    }

    #[test]
    fn test_bucket_names_replace_underscores() {
        let scope = Scope::new("acme_corp", "dev");
        assert_eq!(
            scope.resource_name("static_assets", NameKind::Bucket),
            "acme-corp-static-assets-bucket-dev"
        );
    }

    #[test]
    fn test_identity_names() {
        let scope = scope();
        assert_eq!(scope.resource_name("users", NameKind::Table), "acme_users_table_dev");
        assert_eq!(scope.resource_name("users", NameKind::UserPool), "acme_users_pool_dev");
        assert_eq!(scope.resource_name("web", NameKind::UserPoolClient), "acme_web_client_dev");
        assert_eq!(scope.resource_name("admins", NameKind::UserPoolGroup), "acme_admins_group_dev");
    }

    #[test]
    fn test_names_are_deterministic() {
        let first = scope().resource_name("orders", NameKind::Queue);
        let second = scope().resource_name("orders", NameKind::Queue);
        assert_eq!(first, second);
    }

    #[test]
    fn test_alarm_and_gateway_response_names() {
        let scope = scope();
        assert_eq!(
            scope.alarm_name("orders", "ApproximateAgeOfOldestMessage"),
            "acme_orders_ApproximateAgeOfOldestMessage_dev"
        );
        assert_eq!(scope.gateway_response_name("4XX"), "acme_4XXresponse_dev");
        assert_eq!(scope.gateway_response_name("5XX"), "acme_5XXresponse_dev");
    }
}
