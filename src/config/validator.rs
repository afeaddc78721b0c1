//! Configuration validation rules.
//!
//! - Driver limits must be at least one
//! - The business-hours window must be non-empty and well-formed

use crate::config::schema::ClinflowConfig;
use crate::error::{ClinflowError, Result};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    fn new(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_config(config: &ClinflowConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_settings(config));
    errors.extend(validate_business_hours(config));

    errors
}

fn validate_settings(config: &ClinflowConfig) -> Vec<ValidationError> {
    let settings = &config.settings;
    let mut errors = Vec::new();

    if settings.max_parallel == 0 {
        errors.push(ValidationError::new(
            "max-parallel",
            "settings.max_parallel must be at least 1",
        ));
    }

    if settings.max_attempts == 0 {
        errors.push(ValidationError::new(
            "max-attempts",
            "settings.max_attempts must be at least 1",
        ));
    }

    if settings.max_iterations == 0 {
        errors.push(ValidationError::new(
            "max-iterations",
            "settings.max_iterations must be at least 1",
        ));
    }

    if settings.step_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "step-timeout",
            "settings.step_timeout_secs must be positive when set",
        ));
    }

    errors
}

fn validate_business_hours(config: &ClinflowConfig) -> Vec<ValidationError> {
    let hours = &config.business_hours;
    let mut errors = Vec::new();

    if hours.offset().is_none() {
        errors.push(ValidationError::new(
            "utc-offset",
            format!(
                "business_hours.utc_offset_minutes {} is out of range",
                hours.utc_offset_minutes
            ),
        ));
    }

    if hours.end_hour > 24 {
        errors.push(ValidationError::new(
            "end-hour",
            format!("business_hours.end_hour {} exceeds 24", hours.end_hour),
        ));
    }

    if hours.start_hour >= hours.end_hour {
        errors.push(ValidationError::new(
            "empty-window",
            format!(
                "business_hours.start_hour {} must be before end_hour {}",
                hours.start_hour, hours.end_hour
            ),
        ));
    }

    if hours.weekdays.is_empty() {
        errors.push(ValidationError::new(
            "no-weekdays",
            "business_hours.weekdays must list at least one day",
        ));
    }

    errors
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &ClinflowConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(ClinflowError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
