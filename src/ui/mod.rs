//! User interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for terminal output
//! - [`MockUI`] for capturing output in tests
//!
//! # Example
//!
//! ```
//! use clinflow::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("Plan");
//! ui.success("ingest");
//! assert!(ui.has_success("ingest"));
//! ```

pub mod mock;
pub mod output;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use terminal::TerminalUI;
pub use theme::{format_duration, should_use_colors, ClinflowTheme};

use std::time::Duration;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Change the output mode.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show a contextual hint.
    fn show_hint(&mut self, hint: &str);

    /// Write machine-readable output (JSON, schemas, completion scripts).
    /// Shown in every mode and never styled.
    fn output(&mut self, text: &str);

    /// Show the closing summary of a run.
    fn show_run_summary(&mut self, summary: &RunSummary);
}

/// Closing summary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub duration: Duration,
    pub success: bool,
}

impl RunSummary {
    /// One-line description, e.g. `"4 completed, 1 failed, 1 blocked"`.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("{} completed", self.completed)];
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.blocked > 0 {
            parts.push(format!("{} blocked", self.blocked));
        }
        parts.join(", ")
    }
}
