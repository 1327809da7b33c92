//! Progress spinner output using indicatif.
//!
//! Provides a spinner-style progress indicator during benchmark measurement.

use indicatif::{ProgressBar, ProgressStyle};

/// A progress reporter that wraps an indicatif spinner.
pub struct BenchProgress {
    bar: ProgressBar,
}

impl BenchProgress {
    /// Create a new progress spinner on stderr.
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    /// A reporter that draws nothing (`--quiet`).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update the progress message.
    pub fn update(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    /// Run `f` with the spinner cleared so its output is not interleaved.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.bar.suspend(f)
    }

    /// Finish and clear the progress spinner.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Return a callback closure for use with the harness.
    pub fn callback(&self) -> impl Fn(&str) + '_ {
        move |msg: &str| self.update(msg)
    }
}

impl Default for BenchProgress {
    fn default() -> Self {
        Self::new()
    }
}
