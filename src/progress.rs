use crate::index::OutcomeTally;
use std::path::Path;

/// Trait for reporting indexing progress.
///
/// The CLI implements it with an indicatif spinner; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_load_complete(&self, _records: usize, _duration_secs: f64) {}
    fn on_walk_start(&self, _root: &Path) {}
    fn on_file_done(&self, _processed: u64, _path: &Path) {}
    fn on_walk_complete(&self, _tally: &OutcomeTally, _duration_secs: f64) {}
    fn on_reconcile_start(&self, _stale_paths: usize) {}
    fn on_reconcile_complete(&self, _removed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
