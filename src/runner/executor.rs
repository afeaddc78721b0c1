//! The executor seam: who actually performs a step.
//!
//! The plan never calls executors. The driver looks one up per step name
//! and runs it on a worker thread, so executors must be `Send + Sync`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::plan::{StepName, StepOptions};

/// Everything an executor gets to see about the step it runs.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The step being executed.
    pub step: StepName,
    /// Options object from the request, if one was given.
    pub options: Option<StepOptions>,
    /// Opaque request context.
    pub context: Map<String, Value>,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl StepContext {
    /// Create a context for the first attempt of `step`.
    pub fn new(step: StepName) -> Self {
        Self {
            step,
            options: None,
            context: Map::new(),
            attempt: 1,
        }
    }

    /// Look up a single option value.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.as_ref().and_then(|o| o.get(key))
    }
}

/// What a successful step produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepOutput {
    pub data: Value,
}

impl StepOutput {
    /// Wrap a result value.
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// A step that produced nothing worth keeping.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Performs the work behind one step.
pub trait StepExecutor: Send + Sync {
    /// Run the step once. An `Err` counts as one failed attempt.
    fn execute(&self, ctx: &StepContext) -> Result<StepOutput>;
}

impl<F> StepExecutor for F
where
    F: Fn(&StepContext) -> Result<StepOutput> + Send + Sync,
{
    fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        self(ctx)
    }
}

/// One executor per step name.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<StepName, Arc<dyn StepExecutor>>,
}

impl ExecutorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the executor for `step`.
    pub fn register(&mut self, step: StepName, executor: impl StepExecutor + 'static) {
        self.executors.insert(step, Arc::new(executor));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, step: StepName, executor: impl StepExecutor + 'static) -> Self {
        self.register(step, executor);
        self
    }

    /// The executor for `step`, if registered.
    pub fn get(&self, step: StepName) -> Option<Arc<dyn StepExecutor>> {
        self.executors.get(&step).cloned()
    }

    /// Check if `step` has an executor.
    pub fn contains(&self, step: StepName) -> bool {
        self.executors.contains_key(&step)
    }

    /// Registered step names, in enumeration order.
    pub fn steps(&self) -> Vec<StepName> {
        let mut steps: Vec<_> = self.executors.keys().copied().collect();
        steps.sort();
        steps
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("steps", &self.steps())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClinflowError;
    use serde_json::json;

    fn succeed(_: &StepContext) -> Result<StepOutput> {
        Ok(StepOutput::empty())
    }

    #[test]
    fn closures_are_executors() {
        let exec = |ctx: &StepContext| -> Result<StepOutput> {
            Ok(StepOutput::new(json!({ "step": ctx.step })))
        };
        let output = exec.execute(&StepContext::new(StepName::Ingest)).unwrap();
        assert_eq!(output.data["step"], "ingest");
    }

    #[test]
    fn option_lookup() {
        let mut ctx = StepContext::new(StepName::ScheduleCall);
        assert!(ctx.option("delayMinutes").is_none());

        let mut options = Map::new();
        options.insert("delayMinutes".into(), json!(30));
        ctx.options = Some(options);
        assert_eq!(ctx.option("delayMinutes"), Some(&json!(30)));
    }

    #[test]
    fn registry_registers_and_replaces() {
        let mut registry = ExecutorRegistry::new();
        registry.register(StepName::Ingest, succeed);
        registry.register(StepName::Ingest, |_: &StepContext| -> Result<StepOutput> {
            Err(ClinflowError::StepExecutionError {
                step: "ingest".into(),
                message: "replaced".into(),
            })
        });

        assert!(registry.contains(StepName::Ingest));
        let exec = registry.get(StepName::Ingest).unwrap();
        assert!(exec.execute(&StepContext::new(StepName::Ingest)).is_err());
    }

    #[test]
    fn registry_lists_steps_in_order() {
        let registry = ExecutorRegistry::new()
            .with(StepName::ScheduleCall, succeed)
            .with(StepName::Ingest, succeed);
        assert_eq!(
            registry.steps(),
            vec![StepName::Ingest, StepName::ScheduleCall]
        );
        assert!(registry.get(StepName::PrepareEmail).is_none());
    }
}
