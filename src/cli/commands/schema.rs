//! The `clinflow schema` command.

use crate::error::{ClinflowError, Result};
use crate::plan::request_schema;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Prints the request JSON Schema.
#[derive(Debug, Default)]
pub struct SchemaCommand;

impl SchemaCommand {
    /// Create a new schema command.
    pub fn new() -> Self {
        Self
    }
}

impl Command for SchemaCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let schema = serde_json::to_string_pretty(&request_schema())
            .map_err(|e| ClinflowError::Other(e.into()))?;
        ui.output(&schema);
        Ok(CommandResult::success())
    }
}
