//! The fixed set of pipeline steps and their dependency table.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClinflowError;

/// A named stage of the clinical-operations pipeline.
///
/// Variants are declared in enumeration order; `Ord` follows it, so sorted
/// collections of step names come out in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepName {
    Ingest,
    ExtractEntities,
    GenerateSummary,
    PrepareEmail,
    ScheduleEmail,
    ScheduleCall,
}

impl StepName {
    /// Every step, in enumeration order.
    pub const ALL: [StepName; 6] = [
        StepName::Ingest,
        StepName::ExtractEntities,
        StepName::GenerateSummary,
        StepName::PrepareEmail,
        StepName::ScheduleEmail,
        StepName::ScheduleCall,
    ];

    /// The wire name of the step.
    pub fn as_str(self) -> &'static str {
        match self {
            StepName::Ingest => "ingest",
            StepName::ExtractEntities => "extractEntities",
            StepName::GenerateSummary => "generateSummary",
            StepName::PrepareEmail => "prepareEmail",
            StepName::ScheduleEmail => "scheduleEmail",
            StepName::ScheduleCall => "scheduleCall",
        }
    }

    /// Steps that must complete before this one is eligible.
    ///
    /// `ScheduleCall` only needs extracted entities, so it stays runnable
    /// when the email branch fails.
    pub fn dependencies(self) -> &'static [StepName] {
        use StepName::*;
        match self {
            Ingest => &[],
            ExtractEntities => &[Ingest],
            GenerateSummary => &[Ingest, ExtractEntities],
            PrepareEmail => &[GenerateSummary],
            ScheduleEmail => &[PrepareEmail],
            ScheduleCall => &[Ingest, ExtractEntities],
        }
    }

    /// Check if this step directly depends on `other`.
    pub fn depends_on(self, other: StepName) -> bool {
        self.dependencies().contains(&other)
    }

    /// Steps that directly depend on this one, in enumeration order.
    pub fn dependents(self) -> Vec<StepName> {
        StepName::ALL
            .into_iter()
            .filter(|s| s.depends_on(self))
            .collect()
    }

    /// Steps that depend on this one, directly or indirectly.
    pub fn transitive_dependents(self) -> BTreeSet<StepName> {
        let mut result = BTreeSet::new();
        let mut to_visit = vec![self];

        while let Some(current) = to_visit.pop() {
            for dependent in current.dependents() {
                if result.insert(dependent) {
                    to_visit.push(dependent);
                }
            }
        }

        result
    }

    /// The whole dependency table, in enumeration order.
    pub fn dependency_table() -> Vec<(StepName, &'static [StepName])> {
        StepName::ALL
            .into_iter()
            .map(|s| (s, s.dependencies()))
            .collect()
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepName {
    type Err = ClinflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepName::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| ClinflowError::UnknownStep {
                name: s.to_string(),
            })
    }
}

/// Join step names for display, e.g. `"ingest, extractEntities"`.
pub fn join_steps(steps: &[StepName]) -> String {
    steps
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
