//! clinflow - Execution planning for a clinical-operations pipeline.
//!
//! A request enables some of six fixed steps (ingest, entity extraction,
//! summary generation, email preparation, and two scheduling steps). The
//! [`plan::ExecutionPlan`] decides which enabled steps may run next given
//! what has completed and failed; the [`runner::PlanDriver`] executes those
//! batches until nothing is left.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`executors`] - Built-in simulated executors
//! - [`plan`] - Step names, requests, and the execution plan
//! - [`runner`] - Executor registry, driver loop, and checkpoints
//! - [`schedule`] - Business-hours slot calculation
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use clinflow::config::Settings;
//! use clinflow::executors::simulated_registry;
//! use clinflow::plan::{ExecutionPlan, OrchestrationRequest, StepName};
//! use clinflow::runner::PlanDriver;
//! use clinflow::schedule::BusinessHours;
//! use std::collections::BTreeSet;
//!
//! let request = OrchestrationRequest::new().enable_all(StepName::ALL);
//! let plan = ExecutionPlan::new(&request);
//!
//! let fail = BTreeSet::from([StepName::GenerateSummary]);
//! let registry = simulated_registry(&fail, &BusinessHours::default());
//! let report = PlanDriver::new(registry, Settings::default())
//!     .run(&plan, request.context())
//!     .unwrap();
//!
//! assert_eq!(report.failed, vec![StepName::GenerateSummary]);
//! assert_eq!(report.blocked, vec![StepName::PrepareEmail, StepName::ScheduleEmail]);
//! assert!(report.completed.contains(&StepName::ScheduleCall));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executors;
pub mod plan;
pub mod runner;
pub mod schedule;
pub mod ui;

pub use error::{ClinflowError, Result};
