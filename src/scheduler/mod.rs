//! Bounded per-file work scheduling with hang detection.
//!
//! Units run on a small pool of worker threads. `submit` blocks while the
//! number of running units younger than `abandon_after` is at the limit,
//! waiting on the completion channel rather than polling. Units past
//! `abandon_after` are never cancelled; they stop counting against the limit
//! and a replacement worker is spawned so the walk keeps moving.

pub mod hang_log;
pub mod monitor;
pub mod registry;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub use hang_log::{HangEvent, HangKind, HangLog};
pub use monitor::Monitor;
pub use registry::{RunningSet, UnitId, WorkItem};

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub concurrency_limit: usize,
    pub running_long: Duration,
    pub abandon_after: Duration,
    pub monitor_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 6,
            running_long: Duration::from_secs(60),
            abandon_after: Duration::from_secs(5 * 60),
            monitor_interval: Duration::from_secs(60),
        }
    }
}

/// A unit panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub message: String,
}

impl UnitFailure {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self { message }
    }
}

#[derive(Debug)]
pub struct Completion<T> {
    pub id: UnitId,
    pub path: PathBuf,
    pub elapsed: Duration,
    pub result: Result<T, UnitFailure>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub submitted: u64,
    pub completed: u64,
    pub abandoned: usize,
    pub workers: usize,
}

type Work<T> = Arc<dyn Fn(&Path) -> T + Send + Sync>;

struct Job {
    id: UnitId,
    path: PathBuf,
    started: Instant,
}

pub struct Scheduler<T: Send + 'static> {
    config: SchedulerConfig,
    work: Work<T>,
    job_tx: Sender<Job>,
    job_rx: Receiver<Job>,
    done_tx: Sender<Completion<T>>,
    done_rx: Receiver<Completion<T>>,
    running: Arc<RunningSet>,
    hang_log: HangLog,
    workers: Vec<JoinHandle<()>>,
    monitor: Option<Monitor>,
    next_id: UnitId,
    completed: u64,
}

impl<T: Send + 'static> Scheduler<T> {
    pub fn new<F>(config: SchedulerConfig, work: F) -> io::Result<Self>
    where
        F: Fn(&Path) -> T + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        let running = Arc::new(RunningSet::new());
        let hang_log = HangLog::new();
        let monitor = Monitor::spawn(config, Arc::clone(&running), hang_log.clone())?;

        let mut scheduler = Self {
            config,
            work: Arc::new(work),
            job_tx,
            job_rx,
            done_tx,
            done_rx,
            running,
            hang_log,
            workers: Vec::new(),
            monitor: Some(monitor),
            next_id: 0,
            completed: 0,
        };
        for _ in 0..config.concurrency_limit.max(1) {
            scheduler.spawn_worker()?;
        }
        Ok(scheduler)
    }

    pub fn hang_log(&self) -> HangLog {
        self.hang_log.clone()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Queue `path`, first blocking until a slot is free. Completions that
    /// arrive meanwhile are handed to `sink`.
    pub fn submit<F>(&mut self, path: PathBuf, sink: &mut F) -> io::Result<UnitId>
    where
        F: FnMut(Completion<T>),
    {
        self.wait_for_slot(sink)?;

        let id = self.next_id;
        self.next_id += 1;
        let started = Instant::now();
        self.running.insert(id, WorkItem::new(path.clone(), started));
        self.job_tx
            .send(Job { id, path, started })
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "worker pool is gone"))?;

        self.poll(sink);
        Ok(id)
    }

    /// Hand any already finished units to `sink` without blocking.
    pub fn poll<F>(&mut self, sink: &mut F)
    where
        F: FnMut(Completion<T>),
    {
        while let Ok(completion) = self.done_rx.try_recv() {
            self.finish(completion, sink);
        }
    }

    /// Block until every submitted unit has completed, then stop the monitor
    /// and the workers. A unit that never returns blocks here indefinitely.
    pub fn drain<F>(mut self, sink: &mut F) -> SchedulerSummary
    where
        F: FnMut(Completion<T>),
    {
        if !self.running.is_empty() {
            info!("Processing Final Files");
        }
        while !self.running.is_empty() {
            match self.done_rx.recv_timeout(self.config.monitor_interval) {
                Ok(completion) => self.finish(completion, sink),
                Err(RecvTimeoutError::Timeout) => {
                    self.record_crossings();
                    debug!("Waiting on {} unfinished units", self.running.len());
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let summary = SchedulerSummary {
            submitted: self.next_id,
            completed: self.completed,
            abandoned: self.hang_log.count(HangKind::Abandoned),
            workers: self.workers.len(),
        };

        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }
        let Scheduler { job_tx, workers, .. } = self;
        drop(job_tx);
        for worker in workers {
            if worker.join().is_err() {
                debug!("Worker thread panicked");
            }
        }
        summary
    }

    fn wait_for_slot<F>(&mut self, sink: &mut F) -> io::Result<()>
    where
        F: FnMut(Completion<T>),
    {
        loop {
            let now = Instant::now();
            self.record_crossings();
            self.ensure_capacity(now)?;

            let active = self.running.active_count(now, self.config.abandon_after);
            if active < self.config.concurrency_limit {
                return Ok(());
            }

            let full_wait = self.config.monitor_interval;
            let timeout = self
                .running
                .next_abandon_in(now, self.config.abandon_after)
                .map_or(full_wait, |d| d.min(full_wait));

            match self.done_rx.recv_timeout(timeout) {
                Ok(completion) => self.finish(completion, sink),
                Err(RecvTimeoutError::Timeout) => {
                    if timeout == full_wait && active > 1 {
                        info!(
                            "Timed out waiting for worker ({} workers).",
                            self.running.len()
                        );
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "completion channel closed",
                    ))
                }
            }
        }
    }

    fn finish<F>(&mut self, completion: Completion<T>, sink: &mut F)
    where
        F: FnMut(Completion<T>),
    {
        if let Some(item) = self.running.remove(completion.id) {
            if completion.elapsed > self.config.running_long {
                self.hang_log.record(HangEvent {
                    path: item.path,
                    kind: HangKind::FinishedLate,
                    elapsed: completion.elapsed,
                });
            }
        }
        self.completed += 1;
        sink(completion);
    }

    fn record_crossings(&self) {
        let events = self.running.sweep(
            Instant::now(),
            self.config.running_long,
            self.config.abandon_after,
        );
        for event in events {
            self.hang_log.record(event);
        }
    }

    /// Keep one idle-capable worker per slot: stuck units each pin a thread.
    fn ensure_capacity(&mut self, now: Instant) -> io::Result<()> {
        let stuck = self.running.stuck_count(now, self.config.abandon_after);
        while self.workers.len() < self.config.concurrency_limit + stuck {
            debug!("Spawning replacement worker ({} stuck units)", stuck);
            self.spawn_worker()?;
        }
        Ok(())
    }

    fn spawn_worker(&mut self) -> io::Result<()> {
        let job_rx = self.job_rx.clone();
        let done_tx = self.done_tx.clone();
        let work = Arc::clone(&self.work);
        let handle = thread::Builder::new()
            .name(format!("hashfs-worker-{}", self.workers.len()))
            .spawn(move || worker_loop(&job_rx, &done_tx, &work))?;
        self.workers.push(handle);
        Ok(())
    }
}

fn worker_loop<T>(job_rx: &Receiver<Job>, done_tx: &Sender<Completion<T>>, work: &Work<T>) {
    for job in job_rx.iter() {
        let result = panic::catch_unwind(AssertUnwindSafe(|| work(&job.path)))
            .map_err(UnitFailure::from_panic);
        let completion = Completion {
            id: job.id,
            elapsed: job.started.elapsed(),
            path: job.path,
            result,
        };
        if done_tx.send(completion).is_err() {
            break;
        }
    }
}
