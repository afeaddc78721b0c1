//! Orchestration requests: which steps are on, and with what options.
//!
//! A request arrives as JSON or YAML:
//!
//! ```yaml
//! steps:
//!   ingest: true
//!   extractEntities: true
//!   generateSummary:
//!     model: short-form
//!   scheduleCall: false
//! context:
//!   encounterId: enc-42
//! ```
//!
//! Each step value is absent/`null` (off), `false` (off), `true` (on), or an
//! options object (on when non-empty). This module is the single boundary
//! where unknown step names and malformed values are rejected.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClinflowError, Result};

use super::step::StepName;

/// Per-step options payload. Opaque to the planner.
pub type StepOptions = Map<String, Value>;

/// How a request turned a step on or off.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StepSetting {
    /// A bare boolean.
    Toggle(bool),
    /// An options object.
    Options(StepOptions),
}

impl StepSetting {
    /// Whether this setting enables the step.
    ///
    /// An empty options object does not enable a step.
    pub fn is_enabled(&self) -> bool {
        match self {
            StepSetting::Toggle(on) => *on,
            StepSetting::Options(options) => !options.is_empty(),
        }
    }

    /// The options object, if one was supplied.
    pub fn options(&self) -> Option<&StepOptions> {
        match self {
            StepSetting::Toggle(_) => None,
            StepSetting::Options(options) => Some(options),
        }
    }
}

/// A validated orchestration request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct OrchestrationRequest {
    steps: BTreeMap<StepName, StepSetting>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    context: Map<String, Value>,
}

impl OrchestrationRequest {
    /// Create an empty request (every step disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a step on without options.
    pub fn enable(mut self, step: StepName) -> Self {
        self.steps.insert(step, StepSetting::Toggle(true));
        self
    }

    /// Turn several steps on without options.
    pub fn enable_all(mut self, steps: impl IntoIterator<Item = StepName>) -> Self {
        for step in steps {
            self.steps.insert(step, StepSetting::Toggle(true));
        }
        self
    }

    /// Explicitly turn a step off.
    pub fn disable(mut self, step: StepName) -> Self {
        self.steps.insert(step, StepSetting::Toggle(false));
        self
    }

    /// Supply an options object for a step.
    pub fn with_options(mut self, step: StepName, options: StepOptions) -> Self {
        self.steps.insert(step, StepSetting::Options(options));
        self
    }

    /// Attach an opaque context value passed through to executors.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// The setting given for a step, if any.
    pub fn setting(&self, step: StepName) -> Option<&StepSetting> {
        self.steps.get(&step)
    }

    /// The opaque request context.
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Validate a raw JSON value into a request.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStep` for step names outside the pipeline and
    /// `InvalidStepSetting` for values that are neither booleans nor objects.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ClinflowError::RequestParseError {
                    source_name: "request".to_string(),
                    message: format!("expected an object, found {}", type_name(&other)),
                })
            }
        };

        let mut steps = BTreeMap::new();
        match root.remove("steps") {
            None | Some(Value::Null) => {}
            Some(Value::Object(raw_steps)) => {
                for (name, raw) in raw_steps {
                    let step: StepName = name.parse()?;
                    let setting = match raw {
                        Value::Null => continue,
                        Value::Bool(on) => StepSetting::Toggle(on),
                        Value::Object(options) => StepSetting::Options(options),
                        other => {
                            return Err(ClinflowError::InvalidStepSetting {
                                step: name,
                                message: format!(
                                    "expected a boolean or an options object, found {}",
                                    type_name(&other)
                                ),
                            })
                        }
                    };
                    steps.insert(step, setting);
                }
            }
            Some(other) => {
                return Err(ClinflowError::RequestParseError {
                    source_name: "request".to_string(),
                    message: format!("'steps' must be an object, found {}", type_name(&other)),
                })
            }
        }

        let context = match root.remove("context") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(context)) => context,
            Some(other) => {
                return Err(ClinflowError::RequestParseError {
                    source_name: "request".to_string(),
                    message: format!("'context' must be an object, found {}", type_name(&other)),
                })
            }
        };

        Ok(Self { steps, context })
    }

    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| ClinflowError::RequestParseError {
                source_name: "JSON input".to_string(),
                message: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Parse a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| ClinflowError::RequestParseError {
                source_name: "YAML input".to_string(),
                message: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Load a request file. `.json` files are parsed as JSON, anything else
    /// as YAML (a superset of JSON).
    ///
    /// # Errors
    ///
    /// Returns `RequestNotFound` if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClinflowError::RequestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ClinflowError::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };

        parsed.map_err(|e| match e {
            ClinflowError::RequestParseError { message, .. } => {
                ClinflowError::RequestParseError {
                    source_name: path.display().to_string(),
                    message,
                }
            }
            other => other,
        })
    }
}

impl TryFrom<Value> for OrchestrationRequest {
    type Error = ClinflowError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
