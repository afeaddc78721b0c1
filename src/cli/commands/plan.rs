//! Plan command implementation.
//!
//! The `clinflow plan` command shows how a request would execute if every
//! step succeeded, without running anything.

use serde::Serialize;

use crate::cli::args::PlanArgs;
use crate::error::{ClinflowError, Result};
use crate::plan::{join_steps, ExecutionPlan, OrchestrationRequest, StepConfig, StepName};
use crate::ui::theme::ClinflowTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Batches a plan would produce if every step succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanPreview {
    pub steps: Vec<StepConfig>,
    pub batches: Vec<Vec<StepName>>,
    /// Enabled steps that can never run because a dependency is disabled.
    pub unreachable: Vec<StepName>,
}

impl PlanPreview {
    /// Walk a fresh plan for `request`, completing every batch it offers.
    pub fn build(request: &OrchestrationRequest) -> Self {
        let plan = ExecutionPlan::new(request);
        let mut batches = Vec::new();

        loop {
            let batch = plan.next_batch();
            if batch.is_empty() {
                break;
            }
            for step in &batch {
                plan.mark_completed(*step);
            }
            batches.push(batch);
        }

        Self {
            steps: plan.step_configs(),
            batches,
            unreachable: plan.remaining_steps(),
        }
    }
}

/// The plan command implementation.
pub struct PlanCommand {
    args: PlanArgs,
}

impl PlanCommand {
    /// Create a new plan command.
    pub fn new(args: PlanArgs) -> Self {
        Self { args }
    }
}

impl Command for PlanCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let request = OrchestrationRequest::load(&self.args.request)?;
        let preview = PlanPreview::build(&request);

        if self.args.json {
            let json = serde_json::to_string_pretty(&preview)
                .map_err(|e| ClinflowError::Other(e.into()))?;
            ui.output(&json);
            return Ok(CommandResult::success());
        }

        let theme = ClinflowTheme::new();
        ui.show_header(&format!("Plan for {}", self.args.request.display()));

        if preview.batches.is_empty() && preview.unreachable.is_empty() {
            ui.message("No steps enabled.");
            return Ok(CommandResult::success());
        }

        for (i, batch) in preview.batches.iter().enumerate() {
            let mode = if batch.len() > 1 { " (parallel)" } else { "" };
            ui.message(&format!(
                "  {} {}{}",
                theme.info.apply_to(format!("[{}]", i + 1)),
                join_steps(batch),
                theme.dim.apply_to(mode)
            ));
        }

        for step in &preview.unreachable {
            let missing: Vec<StepName> = step
                .dependencies()
                .iter()
                .copied()
                .filter(|dep| preview.steps.iter().any(|c| c.name == *dep && !c.enabled))
                .collect();
            ui.warning(&format!(
                "{} will never run: {} not enabled",
                step,
                join_steps(&missing)
            ));
        }

        Ok(CommandResult::success())
    }
}
