use crate::storage::{Snapshot, Store};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Rows actually deleted.
    pub removed: usize,
    /// Paths whose row was already gone.
    pub already_absent: usize,
    pub failed: usize,
}

/// Delete the store row of every path the walk never confirmed.
///
/// Must only run after every unit of work has completed, so a slow hash can
/// never race the deletion of its own path.
pub fn reconcile(store: &Store, snapshot: &Snapshot, progress_interval: Duration) -> ReconcileStats {
    let paths = snapshot.remaining_paths();
    let total = paths.len();
    info!("Removing: {}", total);

    let mut stats = ReconcileStats::default();
    let mut last_report = Instant::now();

    for (done, path) in paths.iter().enumerate() {
        snapshot.take(path);
        match store.delete(path) {
            Ok(true) => stats.removed += 1,
            Ok(false) => stats.already_absent += 1,
            Err(e) => {
                error!("Error removing {}: {}", path, e);
                stats.failed += 1;
            }
        }

        if last_report.elapsed() > progress_interval {
            info!("Removed: {} / {}", done + 1, total);
            last_report = Instant::now();
        }
    }

    stats
}
