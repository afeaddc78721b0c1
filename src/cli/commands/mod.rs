//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`clinflow plan`, `clinflow run`)
//! - Shared initialization logic
//! - Consistent global flag handling

pub mod completions;
pub mod config;
pub mod dispatcher;
pub mod plan;
pub mod run;
pub mod schema;
pub mod steps;

pub use dispatcher::{
    Command, CommandDispatcher, CommandResult, EXIT_STEPS_FAILED, EXIT_USAGE_ERROR,
};
pub use plan::PlanPreview;
