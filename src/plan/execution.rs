//! The execution plan: step registry plus run-time progress.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::StepConfig;
use super::request::OrchestrationRequest;
use super::step::{join_steps, StepName};

/// Completed and failed steps of a plan, in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanProgress {
    pub completed: Vec<StepName>,
    pub failed: Vec<StepName>,
}

#[derive(Debug, Default)]
struct RunState {
    completed: BTreeSet<StepName>,
    failed: BTreeSet<StepName>,
}

impl RunState {
    fn is_finished(&self, step: StepName) -> bool {
        self.completed.contains(&step) || self.failed.contains(&step)
    }
}

/// Decides which steps of one orchestration run may execute next.
///
/// Step configuration is fixed at construction. Only the completed and
/// failed sets change afterwards, and they only grow. The sets sit behind a
/// mutex so worker threads can report outcomes through a shared reference;
/// every accessor hands out a copy.
#[derive(Debug)]
pub struct ExecutionPlan {
    configs: BTreeMap<StepName, StepConfig>,
    state: Mutex<RunState>,
}

impl ExecutionPlan {
    /// Build a plan from a request. Never fails.
    pub fn new(request: &OrchestrationRequest) -> Self {
        let configs: BTreeMap<StepName, StepConfig> = StepName::ALL
            .into_iter()
            .map(|name| (name, StepConfig::from_request(name, request)))
            .collect();

        let plan = Self {
            configs,
            state: Mutex::new(RunState::default()),
        };
        debug!(
            "Built execution plan with enabled steps: [{}]",
            join_steps(&plan.enabled_steps())
        );
        plan
    }

    /// Rebuild a plan and restore previously completed steps.
    ///
    /// Failed steps are not restored, so a resumed run retries them. Steps
    /// that the request no longer enables are dropped.
    pub fn resume(request: &OrchestrationRequest, progress: &PlanProgress) -> Self {
        let plan = Self::new(request);
        {
            let mut state = plan.state();
            for step in &progress.completed {
                if plan.is_enabled(*step) {
                    state.completed.insert(*step);
                } else {
                    debug!("Ignoring checkpointed step '{}': not enabled", step);
                }
            }
        }
        plan
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_enabled(&self, step: StepName) -> bool {
        self.configs.get(&step).is_some_and(|c| c.enabled)
    }

    fn is_eligible(&self, state: &RunState, step: StepName) -> bool {
        self.is_enabled(step)
            && !state.is_finished(step)
            && step
                .dependencies()
                .iter()
                .all(|dep| state.completed.contains(dep))
    }

    /// Whether `step` may run now: enabled, not finished, and every
    /// dependency completed.
    pub fn should_execute_step(&self, step: StepName) -> bool {
        let state = self.state();
        self.is_eligible(&state, step)
    }

    /// Whether the given steps may run concurrently.
    ///
    /// True iff no member directly depends on another member. Only the
    /// static edges are checked, not current eligibility.
    pub fn can_run_in_parallel(&self, steps: &[StepName]) -> bool {
        steps
            .iter()
            .all(|step| !steps.iter().any(|other| step.depends_on(*other)))
    }

    /// String-keyed form of [`can_run_in_parallel`](Self::can_run_in_parallel).
    ///
    /// An unrecognized name makes the answer `false` rather than an error,
    /// so a typo in a driver never produces a concurrent batch.
    pub fn can_run_in_parallel_names<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let parsed: Option<Vec<StepName>> = names
            .iter()
            .map(|name| name.as_ref().parse::<StepName>().ok())
            .collect();

        match parsed {
            Some(steps) => self.can_run_in_parallel(&steps),
            None => false,
        }
    }

    /// The steps to run next.
    ///
    /// Returns every eligible step when there are several and they are
    /// mutually independent; otherwise the first eligible step alone, or
    /// nothing at all.
    pub fn next_batch(&self) -> Vec<StepName> {
        let ready: Vec<StepName> = {
            let state = self.state();
            StepName::ALL
                .into_iter()
                .filter(|step| self.is_eligible(&state, *step))
                .collect()
        };

        if ready.len() > 1 && self.can_run_in_parallel(&ready) {
            debug!("Next batch (parallel): [{}]", join_steps(&ready));
            return ready;
        }

        let batch: Vec<StepName> = ready.into_iter().take(1).collect();
        debug!("Next batch: [{}]", join_steps(&batch));
        batch
    }

    /// Record a successful step.
    ///
    /// Returns `false` when nothing changed: the step was already completed,
    /// or it already failed, in which case the first outcome stands.
    pub fn mark_completed(&self, step: StepName) -> bool {
        let mut state = self.state();
        if state.failed.contains(&step) {
            warn!(
                "Ignoring completion of step '{}': already marked failed",
                step
            );
            return false;
        }
        state.completed.insert(step)
    }

    /// Record a failed step.
    ///
    /// Returns `false` when nothing changed: the step was already failed, or
    /// it already completed, in which case the first outcome stands.
    pub fn mark_failed(&self, step: StepName) -> bool {
        let mut state = self.state();
        if state.completed.contains(&step) {
            warn!(
                "Ignoring failure of step '{}': already marked completed",
                step
            );
            return false;
        }
        state.failed.insert(step)
    }

    /// Whether any enabled step has not finished yet.
    pub fn has_remaining_steps(&self) -> bool {
        let state = self.state();
        self.configs
            .values()
            .any(|c| c.enabled && !state.is_finished(c.name))
    }

    /// Enabled steps that have not finished, in enumeration order.
    pub fn remaining_steps(&self) -> Vec<StepName> {
        let state = self.state();
        self.configs
            .values()
            .filter(|c| c.enabled && !state.is_finished(c.name))
            .map(|c| c.name)
            .collect()
    }

    /// Remaining steps that can never run because something upstream failed.
    pub fn blocked_steps(&self) -> Vec<StepName> {
        let downstream: BTreeSet<StepName> = {
            let state = self.state();
            state
                .failed
                .iter()
                .flat_map(|failed| failed.transitive_dependents())
                .collect()
        };

        self.remaining_steps()
            .into_iter()
            .filter(|step| downstream.contains(step))
            .collect()
    }

    /// Configuration of one step.
    pub fn step_config(&self, step: StepName) -> Option<StepConfig> {
        self.configs.get(&step).cloned()
    }

    /// Configuration of a step looked up by wire name; `None` when unknown.
    pub fn step_config_by_name(&self, name: &str) -> Option<StepConfig> {
        name.parse::<StepName>()
            .ok()
            .and_then(|step| self.step_config(step))
    }

    /// Configuration of every step, in enumeration order.
    pub fn step_configs(&self) -> Vec<StepConfig> {
        self.configs.values().cloned().collect()
    }

    /// Steps the request turned on, in enumeration order.
    pub fn enabled_steps(&self) -> Vec<StepName> {
        self.configs
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.name)
            .collect()
    }

    /// Steps that completed, in enumeration order.
    pub fn completed_steps(&self) -> Vec<StepName> {
        self.state().completed.iter().copied().collect()
    }

    /// Steps that failed, in enumeration order.
    pub fn failed_steps(&self) -> Vec<StepName> {
        self.state().failed.iter().copied().collect()
    }

    /// Snapshot of both outcome sets, taken under one lock.
    pub fn progress(&self) -> PlanProgress {
        let state = self.state();
        PlanProgress {
            completed: state.completed.iter().copied().collect(),
            failed: state.failed.iter().copied().collect(),
        }
    }
}
