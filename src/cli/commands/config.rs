//! Config command implementation.
//!
//! The `clinflow config` command shows resolved configuration.

use std::path::{Path, PathBuf};

use crate::cli::args::ConfigArgs;
use crate::config::{load_config, validate_config, ConfigPaths};
use crate::error::{ClinflowError, Result};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, EXIT_USAGE_ERROR};

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(project_root: &Path, config_path: Option<&Path>, args: ConfigArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_path: config_path.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = load_config(&self.project_root, self.config_path.as_deref())?;

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&config).map_err(|e| ClinflowError::Other(e.into()))?;
            ui.output(&json);
        } else {
            let sources: Vec<PathBuf> = match &self.config_path {
                Some(path) => vec![path.clone()],
                None => ConfigPaths::discover(&self.project_root)
                    .all_existing()
                    .into_iter()
                    .cloned()
                    .collect(),
            };
            if sources.is_empty() {
                ui.message("# defaults (no config files found)");
            }
            for path in &sources {
                ui.message(&format!("# {}", path.display()));
            }

            let yaml = serde_yaml::to_string(&config).map_err(|e| ClinflowError::Other(e.into()))?;
            ui.output(yaml.trim_end());
        }

        let errors = validate_config(&config);
        for error in &errors {
            ui.error(&format!("[{}] {}", error.rule, error.message));
        }

        if errors.is_empty() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(EXIT_USAGE_ERROR))
        }
    }
}
