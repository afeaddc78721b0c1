//! Run command implementation.
//!
//! The `clinflow run` command drives a request to completion with the
//! built-in simulated executors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cli::args::RunArgs;
use crate::config::{load_config, validate};
use crate::error::{ClinflowError, Result};
use crate::executors::simulated_registry;
use crate::plan::{join_steps, ExecutionPlan, OrchestrationRequest, StepName};
use crate::runner::{Checkpoint, PlanDriver, RunProgress, RunReport, StepStatus};
use crate::ui::{format_duration, RunSummary, UserInterface};

use super::dispatcher::{Command, CommandResult, EXIT_STEPS_FAILED};

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn forced_failures(&self) -> Result<BTreeSet<StepName>> {
        self.args
            .fail
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect()
    }

    fn build_plan(
        &self,
        request: &OrchestrationRequest,
        ui: &mut dyn UserInterface,
    ) -> Result<ExecutionPlan> {
        if !self.args.resume {
            return Ok(ExecutionPlan::new(request));
        }

        let Some(path) = self.args.checkpoint.as_deref() else {
            return Ok(ExecutionPlan::new(request));
        };

        match Checkpoint::load(path)? {
            Some(checkpoint) => {
                if !checkpoint.progress.completed.is_empty() && !self.args.json {
                    ui.message(&format!(
                        "Resuming: {} already completed",
                        join_steps(&checkpoint.progress.completed)
                    ));
                }
                Ok(ExecutionPlan::resume(request, &checkpoint.progress))
            }
            None => {
                ui.warning(&format!(
                    "No checkpoint at {}; starting fresh",
                    path.display()
                ));
                Ok(ExecutionPlan::new(request))
            }
        }
    }

    fn save_checkpoint(plan: &ExecutionPlan, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => Checkpoint::from_plan(plan).save(path),
            None => Ok(()),
        }
    }

    fn show_progress(&self, ui: &mut dyn UserInterface, event: RunProgress<'_>) {
        if self.args.json || !ui.output_mode().shows_progress() {
            return;
        }

        match event {
            RunProgress::BatchStarting {
                iteration,
                steps,
                parallel,
            } => {
                let mode = if parallel { " (parallel)" } else { "" };
                ui.message(&format!("[{}] {}{}", iteration, join_steps(steps), mode));
            }
            RunProgress::StepFinished { record } => match record.status {
                StepStatus::Completed => {
                    ui.success(&format!(
                        "{} ({})",
                        record.step,
                        format_duration(record.duration)
                    ));
                    if ui.output_mode().shows_step_output() {
                        if let Some(output) = &record.output {
                            ui.message(&format!("    {}", output));
                        }
                    }
                }
                StepStatus::Failed => {
                    ui.error(&format!(
                        "{} failed after {} attempt(s): {}",
                        record.step,
                        record.attempts,
                        record.error.as_deref().unwrap_or("unknown error")
                    ));
                }
            },
            RunProgress::StepBlocked { step } => {
                ui.warning(&format!("{} blocked: a dependency failed", step));
            }
            RunProgress::StepStarting { .. } | RunProgress::BatchFinished { .. } => {}
        }
    }

    fn show_report(&self, ui: &mut dyn UserInterface, report: &RunReport) -> Result<()> {
        if self.args.json {
            let json = serde_json::to_string_pretty(report)
                .map_err(|e| ClinflowError::Other(e.into()))?;
            ui.output(&json);
            return Ok(());
        }

        ui.show_run_summary(&RunSummary {
            completed: report.completed.len(),
            failed: report.failed.len(),
            blocked: report.blocked.len(),
            duration: report.duration,
            success: report.success,
        });

        if !report.success && self.args.checkpoint.is_some() && !self.args.resume {
            ui.show_hint("Re-run with --resume to retry failed and blocked steps");
        }
        Ok(())
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = load_config(&self.project_root, self.config_path.as_deref())?;
        validate(&config)?;

        let request = OrchestrationRequest::load(&self.args.request)?;
        let fail = self.forced_failures()?;

        let mut settings = config.settings.clone();
        if self.args.sequential {
            settings = settings.sequential();
        }

        let plan = self.build_plan(&request, ui)?;
        let registry = simulated_registry(&fail, &config.business_hours);
        let driver = PlanDriver::new(registry, settings);
        let checkpoint = self.args.checkpoint.as_deref();

        if !self.args.json {
            ui.show_header(&format!("Running {}", self.args.request.display()));
        }

        let mut checkpoint_error = None;
        let report = driver.run_with_progress(&plan, request.context(), |event| {
            if let RunProgress::BatchFinished { .. } = event {
                if let Err(e) = Self::save_checkpoint(&plan, checkpoint) {
                    checkpoint_error.get_or_insert(e);
                }
            }
            self.show_progress(ui, event);
        });

        // Save whatever finished, even when the driver gave up.
        Self::save_checkpoint(&plan, checkpoint)?;
        if let Some(e) = checkpoint_error {
            return Err(e);
        }

        let report = report?;
        self.show_report(ui, &report)?;

        if report.success {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_STEPS_FAILED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    const FULL_REQUEST: &str = r#"
steps:
  ingest: true
  extractEntities: true
  generateSummary: { style: brief }
  prepareEmail: true
  scheduleEmail: true
  scheduleCall: { delayMinutes: 30 }
context:
  encounterId: enc-42
"#;

    fn setup(request: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("request.yml");
        fs::write(&path, request).unwrap();
        (temp, path)
    }

    fn run_args(request: PathBuf) -> RunArgs {
        RunArgs {
            request,
            fail: Vec::new(),
            sequential: false,
            checkpoint: None,
            resume: false,
            json: false,
        }
    }

    #[test]
    fn full_request_succeeds() {
        let (temp, request) = setup(FULL_REQUEST);
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), None, run_args(request))
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("generateSummary, scheduleCall (parallel)"));
        assert!(ui.has_success("scheduleEmail"));
        assert_eq!(ui.summaries()[0].completed, 6);
    }

    #[test]
    fn forced_failure_blocks_email_branch() {
        let (temp, request) = setup(FULL_REQUEST);
        let mut args = run_args(request);
        args.fail = vec!["generateSummary".to_string()];
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, EXIT_STEPS_FAILED);
        assert!(ui.has_error("generateSummary failed"));
        assert!(ui.has_warning("prepareEmail blocked"));
        assert!(ui.has_warning("scheduleEmail blocked"));
        assert!(ui.has_success("scheduleCall"));
    }

    #[test]
    fn unknown_fail_name_is_error() {
        let (temp, request) = setup(FULL_REQUEST);
        let mut args = run_args(request);
        args.fail = vec!["sendFax".to_string()];
        let mut ui = MockUI::new();

        let err = RunCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap_err();
        assert!(matches!(err, ClinflowError::UnknownStep { name } if name == "sendFax"));
    }

    #[test]
    fn invalid_config_is_error() {
        let (temp, request) = setup(FULL_REQUEST);
        let dir = temp.path().join(".clinflow");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), "settings:\n  max_attempts: 0\n").unwrap();
        let mut ui = MockUI::new();

        let err = RunCommand::new(temp.path(), None, run_args(request))
            .execute(&mut ui)
            .unwrap_err();
        assert!(matches!(err, ClinflowError::ConfigValidationError { .. }));
    }

    #[test]
    fn json_report_only() {
        let (temp, request) = setup("steps:\n  ingest: true\n");
        let mut args = run_args(request);
        args.json = true;
        let mut ui = MockUI::new();

        RunCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.output_text()).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["completed"], serde_json::json!(["ingest"]));
        assert!(ui.messages().is_empty());
        assert!(ui.headers().is_empty());
    }

    #[test]
    fn checkpoint_then_resume_retries_only_unfinished() {
        let (temp, request) = setup(FULL_REQUEST);
        let checkpoint = temp.path().join("state").join("run.yml");

        let mut first = run_args(request.clone());
        first.fail = vec!["prepareEmail".to_string()];
        first.checkpoint = Some(checkpoint.clone());
        let mut ui = MockUI::new();
        let result = RunCommand::new(temp.path(), None, first)
            .execute(&mut ui)
            .unwrap();
        assert!(!result.success);
        assert!(!ui.hints().is_empty());

        let saved = Checkpoint::load(&checkpoint).unwrap().unwrap();
        assert_eq!(saved.progress.failed, vec![StepName::PrepareEmail]);

        let mut second = run_args(request);
        second.checkpoint = Some(checkpoint.clone());
        second.resume = true;
        let mut ui = MockUI::new();
        let result = RunCommand::new(temp.path(), None, second)
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("Resuming"));
        assert!(ui.has_success("prepareEmail"));
        assert!(!ui.has_success("ingest"));

        let saved = Checkpoint::load(&checkpoint).unwrap().unwrap();
        assert_eq!(saved.progress.completed.len(), 6);
        assert!(saved.progress.failed.is_empty());
    }

    #[test]
    fn resume_without_checkpoint_file_starts_fresh() {
        let (temp, request) = setup("steps:\n  ingest: true\n");
        let mut args = run_args(request);
        args.checkpoint = Some(temp.path().join("missing.yml"));
        args.resume = true;
        let mut ui = MockUI::new();

        let result = RunCommand::new(temp.path(), None, args)
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_warning("starting fresh"));
    }

    #[test]
    fn deadlocked_request_is_error() {
        let (temp, request) = setup("steps:\n  ingest: true\n  prepareEmail: true\n");
        let mut ui = MockUI::new();

        let err = RunCommand::new(temp.path(), None, run_args(request))
            .execute(&mut ui)
            .unwrap_err();
        assert!(matches!(err, ClinflowError::Deadlock { .. }));
    }
}
