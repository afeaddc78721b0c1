//! Plan execution: executors, the driver loop, and checkpoints.

pub mod checkpoint;
pub mod driver;
pub mod executor;

pub use checkpoint::Checkpoint;
pub use driver::{PlanDriver, RunProgress, RunReport, StepRecord, StepStatus};
pub use executor::{ExecutorRegistry, StepContext, StepExecutor, StepOutput};
