use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use scanward_core::ProgressReporter;
use std::time::Duration;

/// Spinner shown while `track-dir` walks a directory.
pub struct CliReporter {
    bar: ProgressBar,
}

impl CliReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        Self { bar }
    }
}

impl ProgressReporter for CliReporter {
    fn on_walk_start(&self, root: &str) {
        self.bar.set_message(format!("Registering files under {}...", root));
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_file_tracked(&self, files_tracked: usize, _path: &str) {
        self.bar
            .set_message(format!("Registering... {} files tracked", files_tracked));
    }

    fn on_walk_complete(&self, files_tracked: usize, duration_secs: f64) {
        self.bar.finish_and_clear();
        eprintln!(
            "  {} Registered {} files in {:.2}s",
            "✓".green(),
            files_tracked,
            duration_secs
        );
    }
}
