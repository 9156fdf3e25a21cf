//! Spinner and status lines for long-running cache operations.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::palette::{fmt_failure, fmt_success};

/// Spinner tick interval.
const TICK: Duration = Duration::from_millis(100);

/// Optional spinner with success and failure endings.
///
/// A disabled reporter swallows every message, which is how quiet
/// background refreshes stay invisible.
#[derive(Debug)]
pub struct Progress {
    /// Active spinner, if enabled.
    bar: Option<ProgressBar>,
    /// Whether to colorize the final status line.
    use_color: bool,
}

impl Progress {
    /// Start a spinner with `message` when `enabled`.
    pub fn start(message: &str, enabled: bool, use_color: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(TICK);
            bar
        });
        Self { bar, use_color }
    }

    /// A reporter that prints nothing.
    pub fn hidden() -> Self {
        Self {
            bar: None,
            use_color: false,
        }
    }

    /// Replace the spinner message.
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Stop the spinner with a success line.
    pub fn succeed(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
            eprintln!("{}", fmt_success(message, self.use_color));
        }
    }

    /// Stop the spinner with a failure line.
    pub fn fail(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
            eprintln!("{}", fmt_failure(message, self.use_color));
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        if let Some(bar) = &self.bar
            && !bar.is_finished()
        {
            bar.finish_and_clear();
        }
    }
}
