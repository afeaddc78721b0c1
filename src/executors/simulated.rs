//! Executor that pretends to do the work.

use serde_json::{json, Value};

use crate::error::{ClinflowError, Result};
use crate::runner::{StepContext, StepExecutor, StepOutput};

/// Succeeds (or fails) immediately and echoes the step's options back.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor {
    fail: bool,
}

impl SimulatedExecutor {
    /// An executor that always succeeds.
    pub fn succeeding() -> Self {
        Self { fail: false }
    }

    /// An executor that always fails.
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl StepExecutor for SimulatedExecutor {
    fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        if self.fail {
            return Err(ClinflowError::StepExecutionError {
                step: ctx.step.to_string(),
                message: "simulated failure".to_string(),
            });
        }

        let options = ctx
            .options
            .clone()
            .map(Value::Object)
            .unwrap_or(Value::Null);

        Ok(StepOutput::new(json!({
            "step": ctx.step,
            "attempt": ctx.attempt,
            "options": options,
        })))
    }
}
