//! Drives an [`ExecutionPlan`] to completion.
//!
//! The driver owns everything the plan deliberately does not: executing
//! steps, retries, timeouts, and deciding when a plan is stuck.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{ClinflowError, Result};
use crate::plan::{join_steps, ExecutionPlan, StepName};

use super::executor::{ExecutorRegistry, StepContext, StepExecutor, StepOutput};

/// Progress events emitted while a plan runs.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A batch is about to start.
    BatchStarting {
        iteration: usize,
        steps: &'a [StepName],
        parallel: bool,
    },
    /// A step's worker is being launched.
    StepStarting { step: StepName },
    /// A step reported its final outcome.
    StepFinished { record: &'a StepRecord },
    /// Every step of a batch has reported.
    BatchFinished { iteration: usize },
    /// A step can never run because something upstream failed.
    StepBlocked { step: StepName },
}

/// Final outcome of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

/// What happened to one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: StepName,
    pub status: StepStatus,
    /// Attempts made, including the last one.
    pub attempts: u32,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    fn completed(step: StepName, attempts: u32, duration: Duration, output: StepOutput) -> Self {
        Self {
            step,
            status: StepStatus::Completed,
            attempts,
            duration,
            output: Some(output.data),
            error: None,
        }
    }

    fn failed(step: StepName, attempts: u32, duration: Duration, error: String) -> Self {
        Self {
            step,
            status: StepStatus::Failed,
            attempts,
            duration,
            output: None,
            error: Some(error),
        }
    }

    /// Check if the step completed.
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Result of driving a plan.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Records of executed steps, in reporting order.
    pub steps: Vec<StepRecord>,
    /// All completed steps, including any restored from a checkpoint.
    pub completed: Vec<StepName>,
    pub failed: Vec<StepName>,
    /// Enabled steps that never ran because a dependency failed.
    pub blocked: Vec<StepName>,
    /// Batches executed.
    pub iterations: usize,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
    /// No step failed and none was blocked.
    pub success: bool,
}

impl RunReport {
    /// The record for `step`, if it ran.
    pub fn record(&self, step: StepName) -> Option<&StepRecord> {
        self.steps.iter().find(|r| r.step == step)
    }
}

fn as_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Runs batches from a plan until nothing is left to do.
#[derive(Debug)]
pub struct PlanDriver {
    registry: ExecutorRegistry,
    settings: Settings,
}

impl PlanDriver {
    /// Create a driver.
    pub fn new(registry: ExecutorRegistry, settings: Settings) -> Self {
        Self { registry, settings }
    }

    /// The driver settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Drive `plan` to completion.
    pub fn run(&self, plan: &ExecutionPlan, context: &Map<String, Value>) -> Result<RunReport> {
        self.run_with_progress(plan, context, |_| {})
    }

    /// Drive `plan` to completion with a progress callback.
    ///
    /// # Errors
    ///
    /// - `MissingExecutor` if a pending step has no executor
    /// - `Deadlock` if steps remain that no failure explains
    /// - `IterationLimit` if `max_iterations` batches were not enough
    ///
    /// Step failures are not errors; they show up in the report.
    pub fn run_with_progress(
        &self,
        plan: &ExecutionPlan,
        context: &Map<String, Value>,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<RunReport> {
        let start = Instant::now();
        self.check_executors(plan)?;

        let mut records = Vec::new();
        let mut blocked = Vec::new();
        let mut iterations = 0;

        while plan.has_remaining_steps() {
            if iterations >= self.settings.max_iterations {
                return Err(ClinflowError::IterationLimit {
                    limit: self.settings.max_iterations,
                });
            }

            let batch = plan.next_batch();
            if batch.is_empty() {
                blocked = self.settle_stuck_plan(plan)?;
                for step in &blocked {
                    on_progress(RunProgress::StepBlocked { step: *step });
                }
                break;
            }

            iterations += 1;
            let parallel = self.settings.parallel && batch.len() > 1;
            on_progress(RunProgress::BatchStarting {
                iteration: iterations,
                steps: &batch,
                parallel,
            });

            let chunk_size = if parallel {
                self.settings.max_parallel.max(1)
            } else {
                1
            };

            for chunk in batch.chunks(chunk_size) {
                for record in self.execute_chunk(plan, chunk, context, &mut on_progress) {
                    if record.is_success() {
                        plan.mark_completed(record.step);
                    } else {
                        plan.mark_failed(record.step);
                    }
                    on_progress(RunProgress::StepFinished { record: &record });
                    records.push(record);
                }
            }

            on_progress(RunProgress::BatchFinished {
                iteration: iterations,
            });
        }

        let progress = plan.progress();
        let success = progress.failed.is_empty() && blocked.is_empty();
        info!(
            "Run finished after {} batch(es): {} completed, {} failed, {} blocked",
            iterations,
            progress.completed.len(),
            progress.failed.len(),
            blocked.len()
        );

        Ok(RunReport {
            steps: records,
            completed: progress.completed,
            failed: progress.failed,
            blocked,
            iterations,
            duration: start.elapsed(),
            success,
        })
    }

    fn check_executors(&self, plan: &ExecutionPlan) -> Result<()> {
        match plan
            .remaining_steps()
            .into_iter()
            .find(|step| !self.registry.contains(*step))
        {
            Some(step) => Err(ClinflowError::MissingExecutor {
                step: step.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Called when steps remain but none is eligible. Returns the blocked
    /// steps if failures explain every one of them.
    fn settle_stuck_plan(&self, plan: &ExecutionPlan) -> Result<Vec<StepName>> {
        let blocked = plan.blocked_steps();
        let stuck: Vec<StepName> = plan
            .remaining_steps()
            .into_iter()
            .filter(|step| !blocked.contains(step))
            .collect();

        if !stuck.is_empty() {
            return Err(ClinflowError::Deadlock {
                steps: join_steps(&stuck),
            });
        }

        for step in &blocked {
            warn!("Step '{}' blocked: a dependency failed", step);
        }
        Ok(blocked)
    }

    /// Launch one worker per step and wait for all of them, or the deadline.
    fn execute_chunk(
        &self,
        plan: &ExecutionPlan,
        chunk: &[StepName],
        context: &Map<String, Value>,
        on_progress: &mut impl FnMut(RunProgress<'_>),
    ) -> Vec<StepRecord> {
        let (tx, rx) = mpsc::channel();
        let mut records = Vec::with_capacity(chunk.len());
        // Attempts started per pending step, kept so a timeout can report them
        let mut pending: BTreeMap<StepName, Arc<AtomicU32>> = BTreeMap::new();
        let started = Instant::now();

        for &step in chunk {
            let Some(executor) = self.registry.get(step) else {
                records.push(StepRecord::failed(
                    step,
                    0,
                    Duration::ZERO,
                    ClinflowError::MissingExecutor {
                        step: step.to_string(),
                    }
                    .to_string(),
                ));
                continue;
            };

            let ctx = StepContext {
                step,
                options: plan.step_config(step).and_then(|c| c.options),
                context: context.clone(),
                attempt: 1,
            };
            let max_attempts = self.settings.max_attempts.max(1);
            let delay = self.settings.retry_delay();
            let tx = tx.clone();
            let attempts = Arc::new(AtomicU32::new(0));
            let worker_attempts = Arc::clone(&attempts);

            on_progress(RunProgress::StepStarting { step });
            let spawned = thread::Builder::new()
                .name(format!("step-{}", step))
                .spawn(move || {
                    let record = run_attempts(
                        executor.as_ref(),
                        ctx,
                        max_attempts,
                        delay,
                        &worker_attempts,
                    );
                    // The driver stops listening after a timeout
                    let _ = tx.send(record);
                });

            match spawned {
                Ok(_) => {
                    pending.insert(step, attempts);
                }
                Err(e) => {
                    warn!("Could not start worker for step '{}': {}", step, e);
                    records.push(StepRecord::failed(step, 0, Duration::ZERO, e.to_string()));
                }
            }
        }
        drop(tx);

        let deadline = self.settings.step_timeout().map(|t| started + t);

        while !pending.is_empty() {
            let received = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(record) => {
                    pending.remove(&record.step);
                    records.push(record);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let timeout = self.settings.step_timeout().unwrap_or_default();
                    for (step, attempts) in std::mem::take(&mut pending) {
                        warn!("Step '{}' timed out after {:?}", step, timeout);
                        let error = ClinflowError::StepTimeout {
                            step: step.to_string(),
                            timeout,
                        };
                        records.push(StepRecord::failed(
                            step,
                            attempts_started(&attempts),
                            timeout,
                            error.to_string(),
                        ));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    for (step, attempts) in std::mem::take(&mut pending) {
                        warn!("Worker for step '{}' exited without reporting", step);
                        records.push(StepRecord::failed(
                            step,
                            attempts_started(&attempts),
                            started.elapsed(),
                            "worker exited without reporting an outcome".to_string(),
                        ));
                    }
                }
            }
        }

        records
    }
}

/// Attempts a worker had begun when the driver stopped waiting for it.
fn attempts_started(attempts: &AtomicU32) -> u32 {
    attempts.load(Ordering::SeqCst).max(1)
}

/// Run up to `max_attempts` attempts; only the final outcome is returned.
///
/// `started` is bumped as each attempt begins so the driver can tell how
/// far a worker got if it never reports.
fn run_attempts(
    executor: &dyn StepExecutor,
    mut ctx: StepContext,
    max_attempts: u32,
    delay: Duration,
    started: &AtomicU32,
) -> StepRecord {
    let start = Instant::now();
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        ctx.attempt = attempt;
        started.store(attempt, Ordering::SeqCst);
        debug!("Running step '{}' (attempt {}/{})", ctx.step, attempt, max_attempts);

        match executor.execute(&ctx) {
            Ok(output) => {
                return StepRecord::completed(ctx.step, attempt, start.elapsed(), output);
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < max_attempts {
                    warn!(
                        "Step '{}' attempt {}/{} failed: {}; retrying",
                        ctx.step, attempt, max_attempts, last_error
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }
    }

    warn!(
        "Step '{}' failed after {} attempt(s): {}",
        ctx.step, max_attempts, last_error
    );
    StepRecord::failed(ctx.step, max_attempts, start.elapsed(), last_error)
}
