//! Per-step configuration built once from a request.

use serde::Serialize;

use super::request::{OrchestrationRequest, StepOptions};
use super::step::StepName;

/// Resolved configuration for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepConfig {
    /// The step this entry describes.
    pub name: StepName,
    /// Whether the request turned the step on.
    pub enabled: bool,
    /// Options object from the request, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<StepOptions>,
    /// Steps that must complete first.
    pub dependencies: Vec<StepName>,
}

impl StepConfig {
    /// Build the entry for `name` from a request.
    pub fn from_request(name: StepName, request: &OrchestrationRequest) -> Self {
        let setting = request.setting(name);
        Self {
            name,
            enabled: setting.is_some_and(|s| s.is_enabled()),
            options: setting.and_then(|s| s.options()).cloned(),
            dependencies: name.dependencies().to_vec(),
        }
    }
}
