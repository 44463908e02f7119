/// Trait for reporting directory registration progress.
///
/// The CLI implements it with indicatif. All methods default to no-ops.
pub trait ProgressReporter {
    fn on_walk_start(&self, _root: &str) {}
    fn on_file_tracked(&self, _files_tracked: usize, _path: &str) {}
    fn on_walk_complete(&self, _files_tracked: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
