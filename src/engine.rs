use crate::config::AppConfig;
use crate::error::Error;
use crate::hasher::{ContentHasher, Sha256Hasher};
use crate::index::{FileIndexer, OutcomeTally, UnitReport};
use crate::progress::ProgressReporter;
use crate::reconcile::{self, ReconcileStats};
use crate::scanner::FileWalker;
use crate::scheduler::{Completion, HangLog, Scheduler, SchedulerSummary};
use crate::storage::Store;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct IndexEngine {
    config: AppConfig,
    root: PathBuf,
    store_path: String,
    hasher: Arc<dyn ContentHasher>,
}

#[derive(Debug)]
pub struct IndexResult {
    pub load_duration: Duration,
    pub walk_duration: Duration,
    pub reconcile_duration: Duration,
    pub snapshot_records: usize,
    pub tally: OutcomeTally,
    pub reconcile: ReconcileStats,
    pub scheduler: SchedulerSummary,
    pub hang_log: HangLog,
}

impl IndexEngine {
    pub fn new(config: AppConfig) -> Self {
        let store_path = config.store_path.clone();
        Self {
            config,
            root: PathBuf::from("."),
            store_path,
            hasher: Arc::new(Sha256Hasher),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_store_path(mut self, path: &str) -> Self {
        self.store_path = path.to_string();
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Run one full index update:
    /// 1. Open the store and load the snapshot (failure here aborts the run)
    /// 2. Walk the tree, classifying and hashing through the scheduler
    /// 3. Drain every unit, then delete rows for paths never observed
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<IndexResult, Error> {
        info!("System SQLite version: {}", Store::sqlite_version());
        let store = Arc::new(Store::open(&self.store_path)?);

        // Phase 1: Load
        let load_start = Instant::now();
        let snapshot = Arc::new(store.load_all_with_progress(self.config.progress_interval())?);
        let load_duration = load_start.elapsed();
        let snapshot_records = snapshot.len();
        reporter.on_load_complete(snapshot_records, load_duration.as_secs_f64());
        debug!(
            "Loaded {} records in {:.2}s",
            snapshot_records,
            load_duration.as_secs_f64()
        );

        // Phase 2: Walk
        info!("Indexing {}", self.root.display());
        reporter.on_walk_start(&self.root);
        let walk_start = Instant::now();
        let indexer = FileIndexer::new(
            self.root.clone(),
            Arc::clone(&store),
            Arc::clone(&snapshot),
            Arc::clone(&self.hasher),
        );
        let mut scheduler =
            Scheduler::new(self.config.scheduler_config(), move |path| indexer.process(path))?;
        let hang_log = scheduler.hang_log();

        let progress_interval = self.config.progress_interval();
        let mut tally = OutcomeTally::default();
        let mut last_report = Instant::now();
        let mut on_complete = |completion: Completion<UnitReport>| {
            match &completion.result {
                Ok(report) => tally.record(report),
                Err(failure) => {
                    error!(
                        "Worker failed on {}: {}",
                        completion.path.display(),
                        failure.message
                    );
                    tally.record_panic();
                }
            }
            reporter.on_file_done(tally.processed(), &completion.path);
            if last_report.elapsed() > progress_interval {
                info!("Processed: {}: {}", tally.processed(), tally);
                last_report = Instant::now();
            }
        };

        let walker = FileWalker::new(self.root.clone(), &self.config.ignore_patterns);
        for path in walker.files() {
            scheduler.submit(path, &mut on_complete)?;
        }
        let summary = scheduler.drain(&mut on_complete);
        let walk_duration = walk_start.elapsed();
        info!("Processed: {}: {}", tally.processed(), tally);
        reporter.on_walk_complete(&tally, walk_duration.as_secs_f64());

        // Phase 3: Reconcile
        reporter.on_reconcile_start(snapshot.len());
        let reconcile_start = Instant::now();
        let reconcile_stats = reconcile::reconcile(&store, &snapshot, progress_interval);
        let reconcile_duration = reconcile_start.elapsed();
        reporter.on_reconcile_complete(reconcile_stats.removed, reconcile_duration.as_secs_f64());
        debug!(
            "Reconcile completed in {:.2}s: {} removed, {} failed",
            reconcile_duration.as_secs_f64(),
            reconcile_stats.removed,
            reconcile_stats.failed
        );

        Ok(IndexResult {
            load_duration,
            walk_duration,
            reconcile_duration,
            snapshot_records,
            tally,
            reconcile: reconcile_stats,
            scheduler: summary,
            hang_log,
        })
    }
}
