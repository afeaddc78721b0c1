//! Error types for clinflow operations.
//!
//! This module defines [`ClinflowError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - The plan itself never fails: its queries are total and its mutations
//!   are infallible. Errors come from the boundaries around it.
//! - Use `ClinflowError` for request, config and driver errors that need
//!   distinct handling
//! - Use `anyhow::Error` (via `ClinflowError::Other`) for executor errors
//!   that have no better home

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error type for clinflow operations.
#[derive(Debug, Error)]
pub enum ClinflowError {
    /// A step name outside the fixed pipeline.
    #[error("Unknown step: {name}")]
    UnknownStep { name: String },

    /// A request value that is neither a boolean nor an options object.
    #[error("Invalid setting for step '{step}': {message}")]
    InvalidStepSetting { step: String, message: String },

    /// Request file not found.
    #[error("Request not found: {path}")]
    RequestNotFound { path: PathBuf },

    /// Failed to parse an orchestration request.
    #[error("Failed to parse request from {source_name}: {message}")]
    RequestParseError {
        source_name: String,
        message: String,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// An enabled step has no executor registered.
    #[error("No executor registered for step '{step}'")]
    MissingExecutor { step: String },

    /// An executor reported failure.
    #[error("Step '{step}' failed: {message}")]
    StepExecutionError { step: String, message: String },

    /// An executor did not report back in time.
    #[error("Step '{step}' timed out after {}s", timeout.as_secs())]
    StepTimeout { step: String, timeout: Duration },

    /// Steps remain but none can ever become eligible.
    #[error("Plan is stuck; no further progress possible for: {steps}")]
    Deadlock { steps: String },

    /// The driver loop ran more iterations than allowed.
    #[error("Driver stopped after {limit} iterations with steps still pending")]
    IterationLimit { limit: usize },

    /// Checkpoint file could not be read or is incompatible.
    #[error("Checkpoint error at {path}: {message}")]
    CheckpointError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for clinflow operations.
pub type Result<T> = std::result::Result<T, ClinflowError>;
