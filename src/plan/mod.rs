//! Execution planning for the clinical-operations pipeline.
//!
//! - [`StepName`] - The closed set of pipeline stages and their dependency table
//! - [`OrchestrationRequest`] - Which steps a run enables, and their options
//! - [`StepConfig`] - Per-step configuration resolved from a request
//! - [`ExecutionPlan`] - Decides which steps may run next
//! - [`request_schema`] - JSON Schema of the request format
//!
//! # Example
//!
//! ```
//! use clinflow::plan::{ExecutionPlan, OrchestrationRequest, StepName};
//!
//! let request = OrchestrationRequest::new()
//!     .enable(StepName::Ingest)
//!     .enable(StepName::ExtractEntities);
//! let plan = ExecutionPlan::new(&request);
//!
//! assert_eq!(plan.next_batch(), vec![StepName::Ingest]);
//! plan.mark_completed(StepName::Ingest);
//! assert_eq!(plan.next_batch(), vec![StepName::ExtractEntities]);
//! plan.mark_completed(StepName::ExtractEntities);
//!
//! assert!(plan.next_batch().is_empty());
//! assert!(!plan.has_remaining_steps());
//! ```

pub mod config;
pub mod execution;
pub mod request;
pub mod schema;
pub mod step;

pub use config::StepConfig;
pub use execution::{ExecutionPlan, PlanProgress};
pub use request::{OrchestrationRequest, StepOptions, StepSetting};
pub use schema::request_schema;
pub use step::{join_steps, StepName};
