// Soak run: create and destroy message buffers until Ctrl+C, reporting RSS.
//
//   cargo run --example churn --release

use memory_stats::memory_stats;
use msgbuf_shim::{Malloc, MessageBuffer, TrackingAllocator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BATCH: usize = 64;

fn main() {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping churn...");
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let tracker = TrackingAllocator::new(Malloc);
    let baseline = memory_stats().map(|m| m.physical_mem);
    println!("Churning message buffers (batch of {}). Press Ctrl+C to stop.", BATCH);
    println!("Baseline RSS: {:?}", baseline);

    let mut last_report = Instant::now();
    let mut held = Vec::with_capacity(BATCH);

    while running.load(Ordering::SeqCst) {
        for _ in 0..BATCH {
            match MessageBuffer::create_in(&tracker) {
                Ok(buf) => held.push(buf),
                Err(e) => {
                    eprintln!("create failed: {}", e);
                    break;
                }
            }
        }
        for buf in held.drain(..) {
            buf.destroy();
        }

        if last_report.elapsed() >= Duration::from_secs(1) {
            let rss = memory_stats().map(|m| m.physical_mem);
            println!(
                "cycles: {:>12}  live: {}  rss: {:?}",
                tracker.total_allocations(),
                tracker.live(),
                rss
            );
            last_report = Instant::now();
        }
    }

    println!("Final: {:#?}", tracker);
    if !tracker.is_balanced() {
        eprintln!("Unbalanced allocator after churn");
        std::process::exit(1);
    }
}
