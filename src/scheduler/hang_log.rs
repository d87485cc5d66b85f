use indicatif::HumanDuration;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangKind {
    /// Crossed the running-long threshold.
    RunningLong,
    /// Crossed the abandon ceiling; no longer counts against the limit.
    Abandoned,
    /// Completed after crossing the running-long threshold.
    FinishedLate,
}

impl fmt::Display for HangKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HangKind::RunningLong => f.write_str("Running"),
            HangKind::Abandoned => f.write_str("Abandoned"),
            HangKind::FinishedLate => f.write_str("Finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HangEvent {
    pub path: PathBuf,
    pub kind: HangKind,
    pub elapsed: Duration,
}

/// Shared record of slow and stuck units, appended by the scheduler and its
/// monitor. Cloning shares the same log.
#[derive(Debug, Clone, Default)]
pub struct HangLog {
    events: Arc<Mutex<Vec<HangEvent>>>,
}

impl HangLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: HangEvent) {
        match event.kind {
            HangKind::RunningLong | HangKind::Abandoned => warn!(
                "{} ({}): {}",
                event.kind,
                HumanDuration(event.elapsed),
                event.path.display()
            ),
            HangKind::FinishedLate => info!(
                "{} ({}): {}",
                event.kind,
                HumanDuration(event.elapsed),
                event.path.display()
            ),
        }
        self.events.lock().push(event);
    }

    pub fn contains(&self, path: &Path, kind: HangKind) -> bool {
        self.events
            .lock()
            .iter()
            .any(|e| e.kind == kind && e.path == path)
    }

    pub fn count(&self, kind: HangKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }
}
