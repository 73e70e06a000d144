//! Ten threads, each waiting for the previous one before it terminates.
//!
//! Run with: cargo run --example join_chain

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

fn main() -> std::io::Result<()> {
    env_logger::init();

    let (start_tx, start_rx) = mpsc::channel::<()>();
    let mut previous: JoinHandle<()> = thread::Builder::new()
        .name("main-gate".to_string())
        .spawn(move || {
            start_rx.recv().ok();
        })?;

    for i in 0..10 {
        let prev = previous;
        previous = thread::Builder::new()
            .name(i.to_string())
            .spawn(move || {
                if prev.join().is_err() {
                    log::warn!("previous thread panicked");
                }
                println!("{} terminate.", thread::current().name().unwrap_or("?"));
            })?;
    }

    thread::sleep(Duration::from_secs(1));
    println!("main terminate.");
    start_tx.send(()).ok();

    if previous.join().is_err() {
        log::error!("last thread in the chain panicked");
    }
    Ok(())
}
