use super::hang_log::{HangEvent, HangKind};
use dashmap::DashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub type UnitId = u64;

/// A submitted unit that has not completed yet.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub path: PathBuf,
    pub started: Instant,
    reported_long: bool,
    reported_abandoned: bool,
}

impl WorkItem {
    pub fn new(path: PathBuf, started: Instant) -> Self {
        Self {
            path,
            started,
            reported_long: false,
            reported_abandoned: false,
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// Units currently running, keyed by id. Shared between the submitting
/// thread and the monitor.
#[derive(Debug, Default)]
pub struct RunningSet {
    items: DashMap<UnitId, WorkItem>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: UnitId, item: WorkItem) {
        self.items.insert(id, item);
    }

    pub fn remove(&self, id: UnitId) -> Option<WorkItem> {
        self.items.remove(&id).map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Units still counting against the concurrency limit.
    pub fn active_count(&self, now: Instant, abandon_after: Duration) -> usize {
        self.items
            .iter()
            .filter(|item| item.elapsed_at(now) < abandon_after)
            .count()
    }

    pub fn stuck_count(&self, now: Instant, abandon_after: Duration) -> usize {
        self.len() - self.active_count(now, abandon_after)
    }

    /// Time until the next active unit crosses the abandon ceiling.
    pub fn next_abandon_in(&self, now: Instant, abandon_after: Duration) -> Option<Duration> {
        self.items
            .iter()
            .map(|item| item.elapsed_at(now))
            .filter(|elapsed| *elapsed < abandon_after)
            .map(|elapsed| abandon_after - elapsed)
            .min()
    }

    pub fn long_running(&self, now: Instant, running_long: Duration) -> Vec<(PathBuf, Duration)> {
        self.items
            .iter()
            .filter_map(|item| {
                let elapsed = item.elapsed_at(now);
                (elapsed >= running_long).then(|| (item.path.clone(), elapsed))
            })
            .collect()
    }

    /// Flag units newly past either threshold. Each crossing is returned once.
    pub fn sweep(
        &self,
        now: Instant,
        running_long: Duration,
        abandon_after: Duration,
    ) -> Vec<HangEvent> {
        let mut events = Vec::new();
        for mut item in self.items.iter_mut() {
            let elapsed = item.elapsed_at(now);
            if !item.reported_long && elapsed >= running_long {
                item.reported_long = true;
                events.push(HangEvent {
                    path: item.path.clone(),
                    kind: HangKind::RunningLong,
                    elapsed,
                });
            }
            if !item.reported_abandoned && elapsed >= abandon_after {
                item.reported_abandoned = true;
                events.push(HangEvent {
                    path: item.path.clone(),
                    kind: HangKind::Abandoned,
                    elapsed,
                });
            }
        }
        events
    }
}
