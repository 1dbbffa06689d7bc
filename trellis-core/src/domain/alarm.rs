//! Alarm definition domain type

use serde::{Deserialize, Serialize};

/// Threshold alarm on a single metric of a resource
///
/// Field names follow the configuration keys (`name`, `number`, `periods`,
/// `points`, `actions`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDefinition {
    /// Metric the alarm watches
    #[serde(rename = "name")]
    pub metric_name: String,
    #[serde(rename = "number")]
    pub threshold: f64,
    #[serde(rename = "periods")]
    pub evaluation_periods: u32,
    #[serde(rename = "points")]
    pub datapoints_to_alarm: u32,
    #[serde(rename = "actions")]
    pub actions_enabled: bool,
}

impl AlarmDefinition {
    /// Checks the definition is coherent
    ///
    /// # Errors
    /// Returns a description of the first problem found
    pub fn validate(&self) -> Result<(), String> {
        if self.metric_name.trim().is_empty() {
            return Err("metric name cannot be empty".to_string());
        }
        if !self.threshold.is_finite() {
            return Err(format!("threshold must be finite, got {}", self.threshold));
        }
        if self.evaluation_periods == 0 {
            return Err("periods must be greater than 0".to_string());
        }
        if self.datapoints_to_alarm > self.evaluation_periods {
            return Err(format!(
                "points ({}) cannot exceed periods ({})",
                self.datapoints_to_alarm, self.evaluation_periods
            ));
        }
        Ok(())
    }
}
