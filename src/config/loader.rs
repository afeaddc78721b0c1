//! Configuration file discovery and loading.
//!
//! Configuration is optional: a project without any config file runs with
//! [`ClinflowConfig::default`].

use crate::config::merger::merge_configs;
use crate::config::schema::ClinflowConfig;
use crate::error::{ClinflowError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".clinflow";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`.clinflow/config.yml`)
/// 2. Local overrides (`.clinflow/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .clinflow/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .clinflow/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Load a config file as a raw YAML value (for merging).
///
/// An empty file yields `Value::Null`.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;

    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Null);
    }

    serde_yaml::from_str(&content).map_err(|e| ClinflowError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a [`ClinflowConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<ClinflowConfig> {
    if content.trim().is_empty() {
        return Ok(ClinflowConfig::default());
    }

    serde_yaml::from_str(content).map_err(|e| ClinflowError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read and `ConfigParseError` if the
/// YAML does not match the schema.
pub fn load_config_file(path: &Path) -> Result<ClinflowConfig> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, path)
}

/// Load and merge all config files for a project.
pub fn load_merged_config(project_root: &Path) -> Result<ClinflowConfig> {
    let paths = ConfigPaths::discover(project_root);

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        configs.push(load_config_value(path)?);
    }

    if configs.is_empty() {
        tracing::debug!("No config files under {}, using defaults", project_root.display());
        return Ok(ClinflowConfig::default());
    }

    let merged = merge_configs(&configs);

    serde_yaml::from_value(merged).map_err(|e| ClinflowError::ConfigParseError {
        path: project_root.join(CONFIG_DIR).join("config.yml"),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges the project's config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<ClinflowConfig> {
    if let Some(override_path) = config_override {
        load_config_file(override_path)
    } else {
        load_merged_config(project_root)
    }
}
