//! Progress and confirmation callbacks
//!
//! These traits let the engine report what it is doing and ask before
//! mutating anything, without depending on a particular terminal UI.

use crate::error::Result;

/// Progress callback for apply operations
///
/// Implement this trait to receive progress updates while an apply runs.
pub trait ProgressCallback {
    /// Called when an apply step starts, e.g. `reset files`
    fn on_step_start(&mut self, step: &str);

    /// Called when the current step completes
    fn on_step_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_step_start(&mut self, _step: &str) {}
    fn on_step_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Progress callback that records step names, for tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub steps: Vec<String>,
}

impl ProgressCallback for RecordingProgress {
    fn on_step_start(&mut self, step: &str) {
        self.steps.push(step.to_string());
    }

    fn on_step_complete(&mut self) {}
}
