use hashfs::{OutcomeTally, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::path::Path;
use std::time::Duration;

const MESSAGE_EVERY: u64 = 256;

/// CLI progress reporter using an indicatif spinner per phase.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: String) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));

        let mut guard = self.bar.lock();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.bar.lock().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_load_complete(&self, records: usize, duration_secs: f64) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Loaded {} stored records in {:.2}s",
            records, duration_secs
        );
    }

    fn on_walk_start(&self, root: &Path) {
        self.start_spinner(format!("Indexing {}...", root.display()));
    }

    fn on_file_done(&self, processed: u64, _path: &Path) {
        if processed % MESSAGE_EVERY != 0 {
            return;
        }
        if let Some(pb) = self.bar.lock().as_ref() {
            pb.set_message(format!("Indexing... {} files processed", processed));
        }
    }

    fn on_walk_complete(&self, tally: &OutcomeTally, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Walk complete: {} files ({} hashed) in {:.2}s",
            tally.processed(),
            tally.hashed(),
            duration_secs
        );
    }

    fn on_reconcile_start(&self, stale_paths: usize) {
        self.start_spinner(format!("Removing {} stale records...", stale_paths));
    }

    fn on_reconcile_complete(&self, removed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Reconcile complete: {} records removed in {:.2}s",
            removed, duration_secs
        );
    }
}
