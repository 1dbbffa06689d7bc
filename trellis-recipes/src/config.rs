//! Composition settings
//!
//! Defaults that builders fall back to when a configuration leaves a value
//! out: where function code lives, how long functions may run, how many
//! queue messages a consumer receives at once, and how often keep-warm
//! rules fire.

use std::path::PathBuf;
use std::time::Duration;

/// Schedule used by keep-warm rules that do not set their own `rate`
pub const DEFAULT_KEEP_WARM_SCHEDULE: &str = "0/2 * * * ? *";

/// Builder settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Code path used by functions that do not set `code_path`
    pub default_code_path: Option<PathBuf>,

    /// Timeout used by functions that do not set `timeout`
    pub default_timeout: Duration,

    /// Messages handed to a queue consumer per invocation
    pub queue_batch_size: u32,

    /// Cron body for keep-warm rules without a `rate`
    pub keep_warm_schedule: String,
}

impl Settings {
    /// Creates settings with defaults
    pub fn new() -> Self {
        Self {
            default_code_path: None,
            default_timeout: Duration::from_secs(3),
            queue_batch_size: 10,
            keep_warm_schedule: DEFAULT_KEEP_WARM_SCHEDULE.to_string(),
        }
    }

    /// Creates settings from environment variables
    ///
    /// Expected environment variables:
    /// - TRELLIS_LAMBDA_CODE_PATH (optional, no default)
    /// - TRELLIS_LAMBDA_TIMEOUT (optional, seconds, default: 3)
    /// - TRELLIS_QUEUE_BATCH_SIZE (optional, default: 10)
    /// - TRELLIS_KEEP_WARM_SCHEDULE (optional, default: "0/2 * * * ? *")
    ///
    /// # Errors
    /// Fails when a numeric variable is set but cannot be parsed, or when
    /// the resulting settings do not pass [`Settings::validate`]
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates settings from any variable source
    ///
    /// `lookup` returns the value of a variable, or `None` when it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::new();

        let default_code_path = lookup("TRELLIS_LAMBDA_CODE_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let default_timeout = match lookup("TRELLIS_LAMBDA_TIMEOUT") {
            Some(s) => Duration::from_secs(s.parse::<u64>().map_err(|e| {
                anyhow::anyhow!("TRELLIS_LAMBDA_TIMEOUT must be a number of seconds: {}", e)
            })?),
            None => defaults.default_timeout,
        };

        let queue_batch_size = match lookup("TRELLIS_QUEUE_BATCH_SIZE") {
            Some(s) => s
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("TRELLIS_QUEUE_BATCH_SIZE must be a number: {}", e))?,
            None => defaults.queue_batch_size,
        };

        let keep_warm_schedule =
            lookup("TRELLIS_KEEP_WARM_SCHEDULE").unwrap_or(defaults.keep_warm_schedule);

        let settings = Self {
            default_code_path,
            default_timeout,
            queue_batch_size,
            keep_warm_schedule,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Sets the default code path
    pub fn with_default_code_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_code_path = Some(path.into());
        self
    }

    /// Sets the default function timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the queue consumer batch size
    pub fn with_queue_batch_size(mut self, batch_size: u32) -> Self {
        self.queue_batch_size = batch_size;
        self
    }

    /// Validates the settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_timeout.as_secs() == 0 {
            anyhow::bail!("default_timeout must be at least one second");
        }

        if self.default_timeout.as_secs() > 900 {
            anyhow::bail!("default_timeout cannot exceed 900 seconds");
        }

        if self.queue_batch_size == 0 || self.queue_batch_size > 10_000 {
            anyhow::bail!("queue_batch_size must be between 1 and 10000");
        }

        if self.keep_warm_schedule.trim().is_empty() {
            anyhow::bail!("keep_warm_schedule cannot be empty");
        }

        if let Some(path) = &self.default_code_path {
            if path.as_os_str().is_empty() {
                anyhow::bail!("default_code_path cannot be empty");
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_timeout, Duration::from_secs(3));
        assert_eq!(settings.queue_batch_size, 10);
        assert_eq!(settings.keep_warm_schedule, "0/2 * * * ? *");
        assert!(settings.default_code_path.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();

        settings.default_timeout = Duration::from_secs(0);
        assert!(settings.validate().is_err());

        settings.default_timeout = Duration::from_secs(30);
        settings.queue_batch_size = 0;
        assert!(settings.validate().is_err());

        settings.queue_batch_size = 10;
        settings.keep_warm_schedule = " ".to_string();
        assert!(settings.validate().is_err());

        settings.keep_warm_schedule = DEFAULT_KEEP_WARM_SCHEDULE.to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let settings = Settings::new()
            .with_default_code_path("build/functions")
            .with_default_timeout(Duration::from_secs(20))
            .with_queue_batch_size(5);

        assert_eq!(settings.default_code_path, Some(PathBuf::from("build/functions")));
        assert_eq!(settings.default_timeout, Duration::from_secs(20));
        assert_eq!(settings.queue_batch_size, 5);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.default_timeout, Duration::from_secs(3));
        assert_eq!(settings.queue_batch_size, 10);
        assert!(settings.default_code_path.is_none());
    }

    #[test]
    fn test_from_lookup_parses_variables() {
        let settings = Settings::from_lookup(lookup(&[
            ("TRELLIS_LAMBDA_CODE_PATH", "dist/functions"),
            ("TRELLIS_LAMBDA_TIMEOUT", "60"),
            ("TRELLIS_QUEUE_BATCH_SIZE", "25"),
            ("TRELLIS_KEEP_WARM_SCHEDULE", "0/10 * * * ? *"),
        ]))
        .unwrap();

        assert_eq!(settings.default_code_path, Some(PathBuf::from("dist/functions")));
        assert_eq!(settings.default_timeout, Duration::from_secs(60));
        assert_eq!(settings.queue_batch_size, 25);
        assert_eq!(settings.keep_warm_schedule, "0/10 * * * ? *");
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_timeout() {
        let err = Settings::from_lookup(lookup(&[("TRELLIS_LAMBDA_TIMEOUT", "soon")])).unwrap_err();
        assert!(err.to_string().contains("TRELLIS_LAMBDA_TIMEOUT"));
    }

    #[test]
    fn test_from_lookup_validates_values() {
        assert!(Settings::from_lookup(lookup(&[("TRELLIS_QUEUE_BATCH_SIZE", "0")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("TRELLIS_LAMBDA_TIMEOUT", "901")])).is_err());
    }
}
