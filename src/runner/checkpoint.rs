//! Run checkpoints.
//!
//! A checkpoint records which steps of a run completed and failed. Resuming
//! from one restores the completed steps only; failed steps are attempted
//! again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ClinflowError, Result};
use crate::plan::{ExecutionPlan, PlanProgress};

/// Persisted progress of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Schema version for migration.
    pub version: u32,

    /// When the checkpoint was written.
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub progress: PlanProgress,
}

impl Checkpoint {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Snapshot the outcome sets of `plan`.
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            updated_at: Utc::now(),
            progress: plan.progress(),
        }
    }

    /// Load a checkpoint. A missing file means there is nothing to resume.
    ///
    /// # Errors
    ///
    /// Returns `CheckpointError` if the file is malformed or was written by
    /// a newer schema version.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let checkpoint: Self =
            serde_yaml::from_str(&content).map_err(|e| ClinflowError::CheckpointError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if checkpoint.version > Self::CURRENT_VERSION {
            return Err(ClinflowError::CheckpointError {
                path: path.to_path_buf(),
                message: format!(
                    "unsupported version {} (expected {})",
                    checkpoint.version,
                    Self::CURRENT_VERSION
                ),
            });
        }

        Ok(Some(checkpoint))
    }

    /// Save the checkpoint, creating parent directories as needed.
    ///
    /// Writes to a temp file and renames it, so a crash mid-write never
    /// leaves a truncated checkpoint behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let content = serde_yaml::to_string(self).map_err(|e| ClinflowError::CheckpointError {
            path: path.to_path_buf(),
            message: format!("Failed to serialize checkpoint: {}", e),
        })?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
