//! A parked thread notices cancellation, a busy spinner never does.
//!
//! Cancellation is cooperative: a thread only stops if it looks at its token.
//!
//! Run with: cargo run --example interrupted

use bounded_worker_pool::prelude::*;
use std::hint;
use std::thread;
use std::time::Duration;

fn main() -> std::io::Result<()> {
    env_logger::init();

    let sleep_token = CancellationToken::new();
    let sleeper = {
        let token = sleep_token.clone();
        thread::Builder::new()
            .name("SleepThread".to_string())
            .spawn(move || {
                while !token.is_cancelled() {
                    thread::park_timeout(Duration::from_secs(10));
                }
                println!("SleepThread woke up: {:?}", token.reason());
            })?
    };
    let sleeper_thread = sleeper.thread().clone();
    sleep_token.on_cancel(move || sleeper_thread.unpark());

    let busy_token = CancellationToken::new();
    let busy = thread::Builder::new()
        .name("BusyThread".to_string())
        .spawn(|| loop {
            hint::spin_loop();
        })?;

    thread::sleep(Duration::from_secs(2));

    sleep_token.cancel_with_reason(CancellationReason::Interrupted);
    busy_token.cancel_with_reason(CancellationReason::Interrupted);

    println!("SleepThread interrupted is {}", sleep_token.is_cancelled());
    println!("BusyThread interrupted is {}", busy_token.is_cancelled());

    thread::sleep(Duration::from_secs(1));
    println!("SleepThread finished: {}", sleeper.is_finished());
    println!("BusyThread finished: {}", busy.is_finished());

    // The spinner is abandoned; process exit takes it down.
    Ok(())
}
