//! Basic worker pool usage example
//!
//! Demonstrates pool creation, job submission, resizing, and statistics.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use bounded_worker_pool::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Bounded Worker Pool - Basic Usage Example ===\n");

    let pool = ThreadPool::new()?;
    println!(
        "1. Started pool with {} workers (max {})",
        pool.worker_count(),
        pool.max_workers()
    );

    println!("\n2. Submitting simple jobs:");
    for i in 0..10 {
        pool.execute(move || {
            println!(
                "  Job {} executing on {}",
                i,
                thread::current().name().unwrap_or("?")
            );
            thread::sleep(Duration::from_millis(50));
            Ok(())
        });
    }
    println!("   Submitted 10 jobs, {} still queued", pool.job_size());

    thread::sleep(Duration::from_millis(200));

    println!("\n3. Failing jobs are reported, workers keep going:");
    pool.submit(ClosureJob::with_name(
        || Err(ThreadError::other("malformed input")),
        "Parse",
    ));
    pool.execute(|| panic!("unexpected state"));
    let skipped: Option<ClosureJob<fn() -> Result<()>>> = None;
    println!("   Submitting nothing is a no-op: {}", pool.submit_optional(skipped));
    thread::sleep(Duration::from_millis(50));

    println!("\n4. Resizing:");
    let added = pool.add_workers(8)?;
    println!("   Asked for 8 more workers, got {}", added);
    if let Err(e) = pool.remove_workers(pool.worker_count()) {
        println!("   Removing every worker is rejected: {}", e);
    }
    pool.remove_workers(3)?;
    println!("   Removed 3, remaining ids: {:?}", pool.worker_ids());

    println!("\n5. Statistics:");
    let stats = pool.stats();
    println!("   Total jobs submitted: {}", stats.total_jobs_submitted);
    println!("   Total jobs processed: {}", stats.total_jobs_processed());
    println!("   Total jobs failed: {}", stats.total_jobs_failed());
    println!("   Total jobs panicked: {}", stats.total_jobs_panicked());
    for worker in &stats.workers {
        println!(
            "   {}: {} processed, avg time: {:.2}us",
            worker.name, worker.jobs_processed, worker.average_processing_time_us
        );
    }

    println!("\n6. Shutting down...");
    pool.shutdown();
    pool.join()?;
    println!("   Live workers after join: {}", pool.live_workers());

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
