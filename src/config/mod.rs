//! Configuration loading, parsing, and validation for clinflow.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use clinflow::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".clinflow");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "settings:\n  max_attempts: 3\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.settings.max_attempts, 3);
//! ```
//!
//! # Configuration File Locations
//!
//! clinflow discovers and merges configuration in this order:
//! 1. Project config (`.clinflow/config.yml`)
//! 2. Local overrides (`.clinflow/config.local.yml`)
//!
//! Both are optional.

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use loader::{
    load_config, load_config_file, load_config_value, load_merged_config, parse_config,
    ConfigPaths, CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{ClinflowConfig, Settings};
pub use validator::{validate, validate_config, ValidationError};
