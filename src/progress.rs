//! Terminal progress and confirmation for the sync engine.

use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{ConfirmCallback, ProgressCallback};
use std::io;
use std::time::Duration;

/// Create a ticking spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Shows each apply step on a spinner and leaves a line per finished step.
pub struct SpinnerProgress {
    pb: ProgressBar,
    current: Option<String>,
    quiet: bool,
}

impl SpinnerProgress {
    pub fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            spinner("applying")
        };
        Self {
            pb,
            current: None,
            quiet,
        }
    }

    /// Clear the spinner. Must be called before printing after an apply.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_step_start(&mut self, step: &str) {
        log::debug!("step: {step}");
        self.pb.set_message(step.to_string());
        self.current = Some(step.to_string());
    }

    fn on_step_complete(&mut self) {
        if let Some(step) = self.current.take()
            && !self.quiet
        {
            self.pb.println(format!("  {} {}", "✓".green(), step));
        }
    }
}

/// Asks on the terminal, or confirms everything when `assume_yes` is set.
pub struct DialoguerConfirm {
    assume_yes: bool,
}

impl DialoguerConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmCallback for DialoguerConfirm {
    fn confirm(&mut self, prompt: &str) -> reconcile::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| reconcile::Error::io("terminal", io::Error::other(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assume_yes_skips_prompt() {
        let mut confirm = DialoguerConfirm::new(true);
        assert!(confirm.confirm("Apply 3 changes to remote?").unwrap());
    }

    #[test]
    fn test_quiet_progress_tracks_steps() {
        let mut progress = SpinnerProgress::new(true);
        progress.on_step_start("reset files");
        assert_eq!(progress.current.as_deref(), Some("reset files"));
        progress.on_step_complete();
        assert!(progress.current.is_none());
        progress.finish();
    }
}
