//! Integration tests for the execution plan.
//!
//! Most properties are checked exhaustively: every subset of the six steps
//! as a request, driven with every combination of forced failures.

use clinflow::plan::{ExecutionPlan, OrchestrationRequest, StepName};
use serde_json::json;
use std::collections::BTreeSet;
use StepName::*;

fn subset(mask: u32) -> Vec<StepName> {
    StepName::ALL
        .into_iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, s)| s)
        .collect()
}

fn request_for(steps: &[StepName]) -> OrchestrationRequest {
    OrchestrationRequest::new().enable_all(steps.iter().copied())
}

fn assert_invariants(plan: &ExecutionPlan) {
    let enabled = plan.enabled_steps();
    let completed: BTreeSet<_> = plan.completed_steps().into_iter().collect();
    let failed: BTreeSet<_> = plan.failed_steps().into_iter().collect();

    assert!(completed.is_disjoint(&failed), "step both completed and failed");

    for step in StepName::ALL {
        if plan.should_execute_step(step) {
            assert!(enabled.contains(&step), "{} eligible but not enabled", step);
        }
        if step.dependencies().iter().any(|d| !completed.contains(d)) {
            assert!(!plan.should_execute_step(step), "{} eligible too early", step);
        }
    }

    let batch = plan.next_batch();
    for step in &batch {
        assert!(plan.should_execute_step(*step));
    }
    if batch.len() > 1 {
        assert!(plan.can_run_in_parallel(&batch));
    }
}

/// Drive a plan to its end, failing the steps in `fail`.
fn drive(plan: &ExecutionPlan, fail: &BTreeSet<StepName>) {
    let mut seen_completed = BTreeSet::new();
    let mut seen_failed = BTreeSet::new();

    for _ in 0..StepName::ALL.len() + 1 {
        assert_invariants(plan);
        let batch = plan.next_batch();
        if batch.is_empty() {
            break;
        }
        for step in batch {
            if fail.contains(&step) {
                plan.mark_failed(step);
            } else {
                plan.mark_completed(step);
            }
        }

        let completed: BTreeSet<_> = plan.completed_steps().into_iter().collect();
        let failed: BTreeSet<_> = plan.failed_steps().into_iter().collect();
        assert!(seen_completed.is_subset(&completed), "completed set shrank");
        assert!(seen_failed.is_subset(&failed), "failed set shrank");
        seen_completed = completed;
        seen_failed = failed;
    }

    assert!(plan.next_batch().is_empty());
}

#[test]
fn invariants_hold_for_every_request_and_failure_pattern() {
    for request_mask in 0..64 {
        let steps = subset(request_mask);
        for fail_mask in 0..64 {
            let fail: BTreeSet<_> = subset(fail_mask).into_iter().collect();
            let plan = ExecutionPlan::new(&request_for(&steps));
            drive(&plan, &fail);
        }
    }
}

#[test]
fn failure_blocks_exactly_transitive_dependents() {
    for step in StepName::ALL {
        let plan = ExecutionPlan::new(&request_for(&StepName::ALL));
        drive(&plan, &BTreeSet::from([step]));

        let never_ran: BTreeSet<_> = plan.remaining_steps().into_iter().collect();
        assert_eq!(never_ran, step.transitive_dependents(), "failing {}", step);
        assert_eq!(plan.blocked_steps().len(), never_ran.len());
    }
}

#[test]
fn determinism() {
    for mask in 0..64 {
        let steps = subset(mask);
        let a = ExecutionPlan::new(&request_for(&steps));
        let b = ExecutionPlan::new(&request_for(&steps));
        assert_eq!(a.enabled_steps(), b.enabled_steps());
        assert_eq!(a.step_configs(), b.step_configs());
    }
}

#[test]
fn dependency_table_is_fixed() {
    let expected: [(StepName, &[StepName]); 6] = [
        (Ingest, &[]),
        (ExtractEntities, &[Ingest]),
        (GenerateSummary, &[Ingest, ExtractEntities]),
        (PrepareEmail, &[GenerateSummary]),
        (ScheduleEmail, &[PrepareEmail]),
        (ScheduleCall, &[Ingest, ExtractEntities]),
    ];

    for mask in [0, 1, 0b101010, 63] {
        let plan = ExecutionPlan::new(&request_for(&subset(mask)));
        for (step, deps) in expected {
            assert_eq!(plan.step_config(step).unwrap().dependencies, deps.to_vec());
            assert_eq!(
                plan.step_config_by_name(step.as_str()).unwrap().dependencies,
                deps.to_vec()
            );
        }
    }
}

#[test]
fn unknown_names_are_not_found() {
    let plan = ExecutionPlan::new(&request_for(&StepName::ALL));
    assert!(plan.step_config_by_name("sendFax").is_none());
    assert!(!plan.can_run_in_parallel_names(&["ingest", "sendFax"]));
    assert!(plan.can_run_in_parallel_names(&["generateSummary", "scheduleCall"]));
    assert!(!plan.can_run_in_parallel_names(&["ingest", "extractEntities"]));
}

#[test]
fn single_step_is_parallel_safe() {
    let plan = ExecutionPlan::new(&request_for(&[]));
    assert!(plan.can_run_in_parallel(&[ScheduleEmail]));
}

#[test]
fn termination_reachability() {
    let plan = ExecutionPlan::new(&request_for(&[Ingest, ExtractEntities]));

    assert_eq!(plan.next_batch(), vec![Ingest]);
    plan.mark_completed(Ingest);
    assert_eq!(plan.next_batch(), vec![ExtractEntities]);
    plan.mark_completed(ExtractEntities);

    assert!(plan.next_batch().is_empty());
    assert!(!plan.has_remaining_steps());
}

#[test]
fn fan_out_on_failure() {
    let plan = ExecutionPlan::new(&request_for(&[
        Ingest,
        ExtractEntities,
        GenerateSummary,
        PrepareEmail,
        ScheduleCall,
    ]));

    plan.mark_completed(Ingest);
    plan.mark_completed(ExtractEntities);
    plan.mark_failed(GenerateSummary);

    assert_eq!(plan.next_batch(), vec![ScheduleCall]);
    assert!(!plan.should_execute_step(PrepareEmail));
}

#[test]
fn parallel_batch_scenario() {
    let plan = ExecutionPlan::new(&request_for(&[
        Ingest,
        ExtractEntities,
        GenerateSummary,
        PrepareEmail,
        ScheduleCall,
    ]));

    plan.mark_completed(Ingest);
    plan.mark_completed(ExtractEntities);
    plan.mark_completed(GenerateSummary);

    let batch: BTreeSet<_> = plan.next_batch().into_iter().collect();
    assert_eq!(batch, BTreeSet::from([PrepareEmail, ScheduleCall]));
}

#[test]
fn empty_request() {
    let plan = ExecutionPlan::new(&OrchestrationRequest::new());
    assert!(plan.enabled_steps().is_empty());
    assert!(plan.next_batch().is_empty());
    assert!(!plan.has_remaining_steps());
}

#[test]
fn conflicting_outcome_keeps_first() {
    let plan = ExecutionPlan::new(&request_for(&[Ingest]));
    assert!(plan.mark_completed(Ingest));
    assert!(!plan.mark_completed(Ingest));
    assert!(!plan.mark_failed(Ingest));

    assert_eq!(plan.completed_steps(), vec![Ingest]);
    assert!(plan.failed_steps().is_empty());
}

#[test]
fn accessors_return_snapshots() {
    let plan = ExecutionPlan::new(&request_for(&[Ingest]));
    let mut completed = plan.completed_steps();
    completed.push(Ingest);

    assert!(plan.completed_steps().is_empty());
    assert!(plan.should_execute_step(Ingest));
}

#[test]
fn request_values_map_to_enabled_flags() {
    let request = OrchestrationRequest::from_json(
        &json!({
            "steps": {
                "ingest": true,
                "extractEntities": false,
                "generateSummary": { "style": "brief" },
                "prepareEmail": {},
                "scheduleCall": null
            }
        })
        .to_string(),
    )
    .unwrap();
    let plan = ExecutionPlan::new(&request);

    assert_eq!(plan.enabled_steps(), vec![Ingest, GenerateSummary]);
    let summary = plan.step_config(GenerateSummary).unwrap();
    assert_eq!(summary.options.unwrap()["style"], "brief");
    assert!(plan.step_config(Ingest).unwrap().options.is_none());
}

#[test]
fn unknown_request_step_is_rejected() {
    let err = OrchestrationRequest::from_yaml("steps:\n  sendFax: true\n").unwrap_err();
    assert!(err.to_string().contains("sendFax"));
}

#[test]
fn plan_can_be_shared_across_threads() {
    let plan = ExecutionPlan::new(&request_for(&StepName::ALL));
    plan.mark_completed(Ingest);
    plan.mark_completed(ExtractEntities);

    let batch = plan.next_batch();
    assert_eq!(batch, vec![GenerateSummary, ScheduleCall]);

    std::thread::scope(|s| {
        for step in &batch {
            let plan = &plan;
            s.spawn(move || plan.mark_completed(*step));
        }
    });

    assert_eq!(plan.next_batch(), vec![PrepareEmail]);
}
