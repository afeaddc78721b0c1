//! Steps command implementation.
//!
//! The `clinflow steps` command prints the fixed dependency table.

use serde::Serialize;

use crate::cli::args::StepsArgs;
use crate::error::{ClinflowError, Result};
use crate::plan::{join_steps, StepName};
use crate::ui::theme::ClinflowTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

#[derive(Debug, Serialize)]
struct StepEntry {
    name: StepName,
    dependencies: &'static [StepName],
    dependents: Vec<StepName>,
}

/// The steps command implementation.
pub struct StepsCommand {
    args: StepsArgs,
}

impl StepsCommand {
    /// Create a new steps command.
    pub fn new(args: StepsArgs) -> Self {
        Self { args }
    }

    fn entries() -> Vec<StepEntry> {
        StepName::dependency_table()
            .into_iter()
            .map(|(name, dependencies)| StepEntry {
                name,
                dependencies,
                dependents: name.dependents(),
            })
            .collect()
    }
}

impl Command for StepsCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if self.args.json {
            let json = serde_json::to_string_pretty(&Self::entries())
                .map_err(|e| ClinflowError::Other(e.into()))?;
            ui.output(&json);
            return Ok(CommandResult::success());
        }

        let theme = ClinflowTheme::new();
        ui.show_header("Pipeline steps");

        for entry in Self::entries() {
            ui.message(&format!("  {}", theme.highlight.apply_to(entry.name)));
            let deps = if entry.dependencies.is_empty() {
                "no dependencies".to_string()
            } else {
                format!("depends on: {}", join_steps(entry.dependencies))
            };
            ui.message(&format!(
                "    {} {}",
                theme.dim.apply_to("└──"),
                theme.dim.apply_to(deps)
            ));
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    #[test]
    fn lists_every_step_with_dependencies() {
        let mut ui = MockUI::new();
        let result = StepsCommand::new(StepsArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("scheduleCall"));
        assert!(ui.has_message("depends on: ingest, extractEntities"));
        assert!(ui.has_message("no dependencies"));
    }

    #[test]
    fn json_includes_dependents() {
        let mut ui = MockUI::new();
        StepsCommand::new(StepsArgs { json: true })
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.output_text()).unwrap();
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0]["name"], "ingest");
        assert_eq!(
            entries[1]["dependents"],
            serde_json::json!(["generateSummary", "scheduleCall"])
        );
        assert!(ui.messages().is_empty());
    }
}
