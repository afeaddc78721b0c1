//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// clinflow - Plan and run the clinical-operations pipeline.
#[derive(Debug, Parser)]
#[command(name = "clinflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .clinflow/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the pipeline steps and their dependencies
    Steps(StepsArgs),

    /// Show the batches a request would run in
    Plan(PlanArgs),

    /// Run a request with simulated executors
    Run(RunArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),

    /// Print the JSON Schema of the request format
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `steps` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StepsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `plan` command.
#[derive(Debug, Clone, clap::Args)]
pub struct PlanArgs {
    /// Request file (JSON or YAML)
    pub request: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Request file (JSON or YAML)
    pub request: PathBuf,

    /// Make these steps fail (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "STEPS")]
    pub fail: Vec<String>,

    /// Run batches one step at a time
    #[arg(long)]
    pub sequential: bool,

    /// Write progress to this file after every batch
    #[arg(long, value_name = "FILE")]
    pub checkpoint: Option<PathBuf>,

    /// Skip steps the checkpoint records as completed
    #[arg(long, requires = "checkpoint")]
    pub resume: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_fail_list() {
        let cli = Cli::try_parse_from([
            "clinflow",
            "run",
            "request.yml",
            "--fail",
            "generateSummary,scheduleCall",
            "--sequential",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.request, PathBuf::from("request.yml"));
                assert_eq!(args.fail, vec!["generateSummary", "scheduleCall"]);
                assert!(args.sequential);
                assert!(!args.resume);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn resume_requires_checkpoint() {
        let result = Cli::try_parse_from(["clinflow", "run", "request.yml", "--resume"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["clinflow", "steps", "--json", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Steps(StepsArgs { json: true })));
    }
}
