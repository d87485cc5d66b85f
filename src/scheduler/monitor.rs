use super::hang_log::{HangKind, HangLog};
use super::registry::RunningSet;
use super::SchedulerConfig;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use indicatif::HumanDuration;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

/// Background thread that wakes every `monitor_interval` and reports units
/// running past the running-long threshold.
pub struct Monitor {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Monitor {
    pub fn spawn(
        config: SchedulerConfig,
        running: Arc<RunningSet>,
        hang_log: HangLog,
    ) -> io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("hashfs-monitor".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(config.monitor_interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        inspect(&config, &running, &hang_log);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self { stop_tx, handle })
    }

    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            debug!("Monitor thread panicked");
        }
    }
}

/// Record new threshold crossings, then repeat the warning for units that
/// were already reported on an earlier tick. Returns the repeated paths.
fn inspect(config: &SchedulerConfig, running: &RunningSet, hang_log: &HangLog) -> Vec<PathBuf> {
    let now = Instant::now();
    let mut just_reported = Vec::new();
    for event in running.sweep(now, config.running_long, config.abandon_after) {
        if event.kind == HangKind::RunningLong {
            just_reported.push(event.path.clone());
        }
        hang_log.record(event);
    }

    let mut repeated = Vec::new();
    for (path, elapsed) in running.long_running(now, config.running_long) {
        if just_reported.contains(&path) {
            continue;
        }
        warn!("Running ({}): {}", HumanDuration(elapsed), path.display());
        repeated.push(path);
    }
    repeated
}
