//! End-to-end behaviour of the worker pool

use bounded_worker_pool::prelude::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(5);

fn wait_for(condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_construct_clamps_worker_count() {
    assert_eq!(ThreadPool::new().unwrap().worker_count(), 5);
    assert_eq!(ThreadPool::with_workers(0).unwrap().worker_count(), 1);
    assert_eq!(ThreadPool::with_workers(20).unwrap().worker_count(), 10);
}

#[test]
fn test_every_job_runs_exactly_once() {
    let pool = ThreadPool::with_workers(4).expect("Failed to create pool");
    let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..500).map(|_| AtomicUsize::new(0)).collect());

    for i in 0..500 {
        let runs = Arc::clone(&runs);
        pool.execute(move || {
            runs[i].fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    assert!(wait_for(|| pool.job_size() == 0));
    assert!(wait_for(|| runs
        .iter()
        .all(|r| r.load(Ordering::SeqCst) == 1)));

    pool.shutdown();
    pool.join().unwrap();
    assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
}

#[test]
fn test_job_size_bounded_by_submissions() {
    let pool = ThreadPool::with_workers(2).unwrap();
    for k in 1..=50 {
        pool.execute(|| {
            thread::sleep(Duration::from_millis(1));
            Ok(())
        });
        assert!(pool.job_size() <= k);
    }
}

#[test]
fn test_add_workers_to_capacity() {
    let pool = ThreadPool::with_workers(5).unwrap();
    pool.add_workers(8).unwrap();
    assert_eq!(pool.worker_count(), 10);

    pool.add_workers(1).unwrap();
    assert_eq!(pool.worker_count(), 10);
}

#[test]
fn test_remove_all_workers_is_invalid() {
    let pool = ThreadPool::with_workers(5).unwrap();
    let err = pool.remove_workers(5).unwrap_err();
    assert!(matches!(err, ThreadError::InvalidArgument { .. }));
    assert_eq!(pool.worker_count(), 5);
}

#[test]
fn test_single_worker_preserves_order() {
    let pool = ThreadPool::with_workers(1).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for label in ["A", "B", "C"] {
        let order = Arc::clone(&order);
        pool.execute(move || {
            order.lock().push(label);
            Ok(())
        });
    }

    assert!(wait_for(|| order.lock().len() == 3));
    assert_eq!(*order.lock(), ["A", "B", "C"]);
}

#[test]
fn test_double_shutdown() {
    let pool = ThreadPool::with_workers(3).unwrap();
    pool.shutdown();
    pool.shutdown();
    pool.join().unwrap();

    assert_eq!(pool.worker_count(), 3);
    assert_eq!(pool.live_workers(), 0);
    assert!(pool.stats().workers.iter().all(|w| !w.running));
}

#[test]
fn test_failing_job_does_not_stop_worker() {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let reports_clone = Arc::clone(&reports);
    let config = ThreadPoolConfig::new(1).with_error_sink(Arc::new(move |f: &JobFailure| {
        reports_clone.lock().push(f.to_string());
    }));
    let pool = ThreadPool::with_config(config).unwrap();
    let (tx, rx) = mpsc::channel();

    pool.submit(ClosureJob::with_name(
        || Err(ThreadError::other("bad record")),
        "Parse",
    ));
    pool.submit(ClosureJob::with_name(|| panic!("index out of range"), "Index"));
    pool.execute(move || {
        tx.send(thread::current().name().map(str::to_string)).unwrap();
        Ok(())
    });

    let name = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(name.as_deref(), Some("ThreadPool-Worker-1"));

    let reports = reports.lock();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].starts_with("Parse failed on ThreadPool-Worker-1"));
    assert!(reports[1].contains("panic: index out of range"));
}

#[test]
fn test_shutdown_leaves_pending_jobs_queued() {
    let pool = ThreadPool::with_workers(1).unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let ran = Arc::new(AtomicUsize::new(0));

    pool.execute(move || {
        started_tx.send(()).unwrap();
        release_rx.recv_timeout(TIMEOUT).ok();
        Ok(())
    });
    started_rx.recv_timeout(TIMEOUT).unwrap();

    for _ in 0..3 {
        let ran = Arc::clone(&ran);
        pool.execute(move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }

    pool.shutdown();
    release_tx.send(()).unwrap();
    pool.join().unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    assert_eq!(pool.job_size(), 3);
}

#[test]
fn test_shutdown_of_idle_pool_is_prompt() {
    let pool = ThreadPool::with_workers(10).unwrap();
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    pool.shutdown();
    pool.join().unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_removed_busy_worker_finishes_its_job() {
    // Registration-order selection may retire a worker that is mid-job.
    let pool = ThreadPool::with_workers(2).unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let started_tx = started_tx.clone();
        let completed = Arc::clone(&completed);
        pool.execute(move || {
            started_tx.send(thread::current().name().map(str::to_string)).unwrap();
            thread::sleep(Duration::from_millis(100));
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
    let mut names = vec![
        started_rx.recv_timeout(TIMEOUT).unwrap(),
        started_rx.recv_timeout(TIMEOUT).unwrap(),
    ];
    names.sort();
    assert_eq!(
        names,
        [
            Some("ThreadPool-Worker-1".to_string()),
            Some("ThreadPool-Worker-2".to_string())
        ]
    );

    pool.remove_workers(1).unwrap();
    assert_eq!(pool.worker_ids(), vec![2]);

    pool.join().unwrap();
    assert!(completed.load(Ordering::SeqCst) >= 1);
    assert!(wait_for(|| completed.load(Ordering::SeqCst) == 2));
}

#[test]
fn test_interrupted_worker_stays_registered() {
    let pool = ThreadPool::with_workers(1).unwrap();
    pool.interrupt_worker(1).unwrap();
    assert!(wait_for(|| pool.live_workers() == 0));
    assert_eq!(pool.worker_count(), 1);

    // No consumer left: submissions pile up unreported.
    pool.execute(|| Ok(()));
    assert_eq!(pool.job_size(), 1);

    pool.add_workers(1).unwrap();
    assert!(wait_for(|| pool.job_size() == 0));
}

#[test]
fn test_custom_thread_name_prefix() {
    let pool = ThreadPool::with_config(
        ThreadPoolConfig::new(2).with_thread_name_prefix("indexer"),
    )
    .unwrap();
    let names: Vec<String> = pool.stats().workers.into_iter().map(|w| w.name).collect();
    assert_eq!(names, ["indexer-1", "indexer-2"]);
}

#[test]
fn test_configured_max_cannot_exceed_hard_limit() {
    let result = ThreadPool::with_config(ThreadPoolConfig::new(50).with_max_workers(50));
    assert!(matches!(result, Err(ThreadError::InvalidConfig { .. })));

    let pool = ThreadPool::with_config(ThreadPoolConfig::new(50).with_max_workers(4)).unwrap();
    assert_eq!(pool.worker_count(), 4);
    assert_eq!(pool.add_workers(10).unwrap(), 0);
    assert!(pool.worker_count() <= MAX_WORKERS);
}
