//! Built-in executors used by the CLI and in tests.
//!
//! Neither executor talks to the outside world: [`SimulatedExecutor`]
//! answers immediately and [`SchedulingExecutor`] only computes a
//! business-hours slot.

pub mod scheduling;
pub mod simulated;

use std::collections::BTreeSet;

use crate::plan::StepName;
use crate::runner::ExecutorRegistry;
use crate::schedule::BusinessHours;

pub use scheduling::{SchedulingExecutor, DELAY_OPTION};
pub use simulated::SimulatedExecutor;

/// A registry covering every step.
///
/// Steps in `fail` get an always-failing executor. The two scheduling steps
/// otherwise use [`SchedulingExecutor`] with `hours`.
pub fn simulated_registry(fail: &BTreeSet<StepName>, hours: &BusinessHours) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();

    for step in StepName::ALL {
        if fail.contains(&step) {
            registry.register(step, SimulatedExecutor::failing());
            continue;
        }
        match step {
            StepName::ScheduleEmail | StepName::ScheduleCall => {
                registry.register(step, SchedulingExecutor::new(hours.clone()))
            }
            _ => registry.register(step, SimulatedExecutor::succeeding()),
        }
    }

    registry
}
