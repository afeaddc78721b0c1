//! Command-line interface for clinflow.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, ConfigArgs, PlanArgs, RunArgs, StepsArgs,
};
pub use commands::{
    Command, CommandDispatcher, CommandResult, EXIT_STEPS_FAILED, EXIT_USAGE_ERROR,
};
