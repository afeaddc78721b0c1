//! Configuration schema definitions for clinflow.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::schedule::BusinessHours;

/// Root configuration structure for `.clinflow/config.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinflowConfig {
    /// Driver settings
    pub settings: Settings,

    /// Contact window used by the scheduling steps
    pub business_hours: BusinessHours,
}

/// Settings that control how the driver executes a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run multi-step batches concurrently
    pub parallel: bool,

    /// Maximum concurrent steps within one batch
    pub max_parallel: usize,

    /// Per-step deadline in seconds (no deadline when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,

    /// Executor attempts before a step is reported failed
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Upper bound on driver loop iterations
    pub max_iterations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallel: true,
            max_parallel: default_max_parallel(),
            step_timeout_secs: None,
            max_attempts: 1,
            retry_delay_ms: 0,
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_parallel() -> usize {
    4
}

fn default_max_iterations() -> usize {
    32
}

impl Settings {
    /// Per-step deadline, if configured.
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }

    /// Pause between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Settings for running one step at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: ClinflowConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ClinflowConfig::default());
        assert!(config.settings.parallel);
        assert_eq!(config.settings.max_parallel, 4);
        assert_eq!(config.settings.max_attempts, 1);
        assert_eq!(config.settings.max_iterations, 32);
        assert!(config.settings.step_timeout().is_none());
    }

    #[test]
    fn parses_full_settings() {
        let yaml = r#"
settings:
  parallel: false
  max_parallel: 2
  step_timeout_secs: 30
  max_attempts: 3
  retry_delay_ms: 250
  max_iterations: 10
business_hours:
  utc_offset_minutes: -300
  start_hour: 8
  end_hour: 18
  weekdays: [Mon, Wed]
"#;
        let config: ClinflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.settings.parallel);
        assert_eq!(config.settings.max_parallel, 2);
        assert_eq!(config.settings.step_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.settings.max_attempts, 3);
        assert_eq!(config.settings.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.settings.max_iterations, 10);
        assert_eq!(config.business_hours.utc_offset_minutes, -300);
        assert_eq!(config.business_hours.weekdays.len(), 2);
    }

    #[test]
    fn partial_settings_keep_other_defaults() {
        let config: ClinflowConfig =
            serde_yaml::from_str("settings:\n  max_attempts: 2\n").unwrap();
        assert_eq!(config.settings.max_attempts, 2);
        assert!(config.settings.parallel);
        assert_eq!(config.business_hours, BusinessHours::default());
    }

    #[test]
    fn sequential_turns_off_parallel() {
        let settings = Settings::default().sequential();
        assert!(!settings.parallel);
    }

    #[test]
    fn serializes_without_absent_timeout() {
        let yaml = serde_yaml::to_string(&ClinflowConfig::default()).unwrap();
        assert!(!yaml.contains("step_timeout_secs"));
        assert!(yaml.contains("max_parallel: 4"));
    }
}
