//! Executor for the outbound scheduling steps.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde_json::json;

use crate::error::{ClinflowError, Result};
use crate::runner::{StepContext, StepExecutor, StepOutput};
use crate::schedule::BusinessHours;

/// Option naming the minimum wait before reaching out.
pub const DELAY_OPTION: &str = "delayMinutes";

/// Picks the first business-hours slot after an optional delay.
#[derive(Debug, Clone)]
pub struct SchedulingExecutor {
    hours: BusinessHours,
    now: Option<DateTime<Utc>>,
}

impl SchedulingExecutor {
    /// Schedule relative to the current time.
    pub fn new(hours: BusinessHours) -> Self {
        Self { hours, now: None }
    }

    /// Schedule relative to a fixed instant instead of the clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn delay(ctx: &StepContext) -> Result<TimeDelta> {
        let Some(value) = ctx.option(DELAY_OPTION) else {
            return Ok(TimeDelta::zero());
        };

        value
            .as_u64()
            .and_then(|minutes| i64::try_from(minutes).ok())
            .and_then(TimeDelta::try_minutes)
            .ok_or_else(|| ClinflowError::StepExecutionError {
                step: ctx.step.to_string(),
                message: format!(
                    "option '{}' must be a non-negative whole number of minutes, got {}",
                    DELAY_OPTION, value
                ),
            })
    }
}

impl StepExecutor for SchedulingExecutor {
    fn execute(&self, ctx: &StepContext) -> Result<StepOutput> {
        let delay = Self::delay(ctx)?;
        let now = self.now.unwrap_or_else(Utc::now);
        let slot = self.hours.schedule_after(now, delay).ok_or_else(|| {
            ClinflowError::StepExecutionError {
                step: ctx.step.to_string(),
                message: format!(
                    "option '{}' of {} minutes is too far in the future",
                    DELAY_OPTION,
                    delay.num_minutes()
                ),
            }
        })?;

        Ok(StepOutput::new(json!({
            "step": ctx.step,
            "delayMinutes": delay.num_minutes(),
            "scheduledFor": slot.to_rfc3339_opts(SecondsFormat::Secs, true),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::StepName;
    use serde_json::{Map, Value};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn ctx_with_delay(delay: Value) -> StepContext {
        let mut ctx = StepContext::new(StepName::ScheduleCall);
        let mut options = Map::new();
        options.insert(DELAY_OPTION.into(), delay);
        ctx.options = Some(options);
        ctx
    }

    #[test]
    fn no_delay_inside_hours_is_now() {
        let exec =
            SchedulingExecutor::new(BusinessHours::default()).at(utc("2024-03-13T10:00:00Z"));
        let output = exec
            .execute(&StepContext::new(StepName::ScheduleEmail))
            .unwrap();
        assert_eq!(output.data["scheduledFor"], "2024-03-13T10:00:00Z");
        assert_eq!(output.data["delayMinutes"], 0);
    }

    #[test]
    fn delay_past_closing_rolls_to_next_morning() {
        let exec =
            SchedulingExecutor::new(BusinessHours::default()).at(utc("2024-03-13T16:00:00Z"));
        let output = exec.execute(&ctx_with_delay(json!(120))).unwrap();
        assert_eq!(output.data["scheduledFor"], "2024-03-14T09:00:00Z");
        assert_eq!(output.data["delayMinutes"], 120);
    }

    #[test]
    fn invalid_delay_fails_step() {
        let exec = SchedulingExecutor::new(BusinessHours::default());
        for bad in [json!(-5), json!("soon"), json!(1.5)] {
            let err = exec.execute(&ctx_with_delay(bad)).unwrap_err();
            assert!(err.to_string().contains(DELAY_OPTION));
        }
    }

    #[test]
    fn delay_beyond_calendar_range_fails_step() {
        let exec =
            SchedulingExecutor::new(BusinessHours::default()).at(utc("2024-03-13T10:00:00Z"));
        let err = exec
            .execute(&ctx_with_delay(json!(1_000_000_000_000_u64)))
            .unwrap_err();

        assert!(matches!(err, ClinflowError::StepExecutionError { .. }));
        assert!(err.to_string().contains("too far in the future"));
    }
}
