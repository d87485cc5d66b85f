use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hashfs::scheduler::{Completion, HangKind, Scheduler, SchedulerConfig};

fn fast_config(limit: usize) -> SchedulerConfig {
    SchedulerConfig {
        concurrency_limit: limit,
        running_long: Duration::from_millis(50),
        abandon_after: Duration::from_secs(30),
        monitor_interval: Duration::from_millis(20),
    }
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_in_flight_never_exceeds_limit() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (c, p) = (Arc::clone(&current), Arc::clone(&peak));

    let mut scheduler = Scheduler::new(fast_config(3), move |_path: &Path| {
        let now = c.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        c.fetch_sub(1, Ordering::SeqCst);
    })
    .unwrap();

    let mut done = 0;
    let mut sink = |_c: Completion<()>| done += 1;
    for i in 0..24 {
        scheduler.submit(PathBuf::from(format!("f{}", i)), &mut sink).unwrap();
    }
    let summary = scheduler.drain(&mut sink);

    assert_eq!(done, 24);
    assert_eq!(summary.submitted, 24);
    assert_eq!(summary.completed, 24);
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_stuck_unit_does_not_block_others() {
    let (release_tx, release_rx) = unbounded::<()>();
    let mut scheduler = Scheduler::new(fast_config(2), move |path: &Path| {
        if path == Path::new("stuck") {
            let _ = release_rx.recv();
        }
        path.to_string_lossy().into_owned()
    })
    .unwrap();
    let hang_log = scheduler.hang_log();

    let finished = Mutex::new(Vec::new());
    let mut sink = |c: Completion<String>| finished.lock().push(c.result.unwrap());

    scheduler.submit(PathBuf::from("stuck"), &mut sink).unwrap();
    for i in 0..10 {
        scheduler.submit(PathBuf::from(format!("ok{}", i)), &mut sink).unwrap();
    }

    let all_others_done = wait_until(Duration::from_secs(5), || {
        scheduler.poll(&mut sink);
        finished.lock().len() == 10
    });
    assert!(all_others_done);
    assert!(!finished.lock().contains(&"stuck".to_string()));

    let reported = wait_until(Duration::from_secs(5), || {
        hang_log.contains(Path::new("stuck"), HangKind::RunningLong)
    });
    assert!(reported);

    release_tx.send(()).unwrap();
    let summary = scheduler.drain(&mut sink);

    assert_eq!(summary.completed, 11);
    assert!(finished.lock().contains(&"stuck".to_string()));
    assert!(hang_log.contains(Path::new("stuck"), HangKind::FinishedLate));
}

#[test]
fn test_abandoned_unit_frees_its_slot() {
    let (release_tx, release_rx) = unbounded::<()>();
    let config = SchedulerConfig {
        concurrency_limit: 1,
        running_long: Duration::from_millis(20),
        abandon_after: Duration::from_millis(80),
        monitor_interval: Duration::from_millis(10),
    };
    let mut scheduler = Scheduler::new(config, move |path: &Path| {
        if path == Path::new("stuck") {
            let _ = release_rx.recv();
        }
    })
    .unwrap();
    let hang_log = scheduler.hang_log();

    let done = AtomicUsize::new(0);
    let mut sink = |_c: Completion<()>| {
        done.fetch_add(1, Ordering::SeqCst);
    };

    scheduler.submit(PathBuf::from("stuck"), &mut sink).unwrap();
    // With a limit of one these only get a slot once "stuck" is abandoned.
    for i in 0..3 {
        scheduler.submit(PathBuf::from(format!("next{}", i)), &mut sink).unwrap();
    }

    let others_done = wait_until(Duration::from_secs(5), || {
        scheduler.poll(&mut sink);
        done.load(Ordering::SeqCst) == 3
    });
    assert!(others_done);
    assert!(hang_log.contains(Path::new("stuck"), HangKind::Abandoned));
    assert_eq!(scheduler.running_count(), 1);

    release_tx.send(()).unwrap();
    let summary = scheduler.drain(&mut sink);

    assert_eq!(done.load(Ordering::SeqCst), 4);
    assert_eq!(summary.abandoned, 1);
    assert!(summary.workers >= 2);
}

#[test]
fn test_panicking_unit_resolves_to_failure() {
    let mut scheduler = Scheduler::new(fast_config(2), |path: &Path| {
        if path == Path::new("boom") {
            panic!("simulated worker fault");
        }
        1u32
    })
    .unwrap();

    let ok = AtomicUsize::new(0);
    let failures = Mutex::new(Vec::new());
    let mut sink = |c: Completion<u32>| match c.result {
        Ok(_) => {
            ok.fetch_add(1, Ordering::SeqCst);
        }
        Err(failure) => failures.lock().push((c.path, failure.message)),
    };

    for name in ["a", "boom", "b", "c"] {
        scheduler.submit(PathBuf::from(name), &mut sink).unwrap();
    }
    let summary = scheduler.drain(&mut sink);

    assert_eq!(summary.completed, 4);
    assert_eq!(ok.load(Ordering::SeqCst), 3);
    let failures = failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, PathBuf::from("boom"));
    assert!(failures[0].1.contains("simulated worker fault"));
}
