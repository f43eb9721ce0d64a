//! Multi-threaded certificate checking example.
//!
//! This example demonstrates how to check multiple hosts concurrently
//! using threads. Checks are independent; one failing host never affects
//! the others.
//!
//! Run with: cargo run --example multiple_hosts

use certwatch::{check_host, CheckOptions, CheckTarget};
use std::sync::mpsc;
use std::thread;

fn main() {
    println!("=== Multi-Host Certificate Check ===\n");

    let hosts = vec![
        "google.com",
        "github.com",
        "rust-lang.org",
        "crates.io",
        "docs.rs",
    ];

    let (tx, rx) = mpsc::channel();

    // Spawn a thread for each host
    for host in hosts {
        let tx = tx.clone();
        thread::spawn(move || {
            let result = CheckTarget::parse(host)
                .map(|target| check_host(&target, &CheckOptions::default()));
            tx.send((host, result)).unwrap();
        });
    }

    // Drop the original sender so the receiver knows when all threads are done
    drop(tx);

    // Collect and display results
    let mut results: Vec<_> = rx.iter().collect();
    results.sort_by_key(|(host, _)| *host);

    println!("{:<20} {:<12} {:<10} {}", "Host", "Status", "Days Left", "Identity");
    println!("{}", "=".repeat(60));

    for (host, result) in results {
        match result {
            Ok(check) => match &check.error {
                Some(report) => println!("{:<20} ERROR: {}", host, report.message),
                None => {
                    let status = if check.expiring == Some(true) {
                        "EXPIRING"
                    } else {
                        "OK"
                    };
                    let identity = if check.identity_matched == Some(true) {
                        "match"
                    } else {
                        "MISMATCH"
                    };
                    println!(
                        "{:<20} {:<12} {:<10} {}",
                        host,
                        status,
                        check.days_remaining.unwrap_or(0),
                        identity
                    );
                }
            },
            Err(e) => println!("{:<20} ERROR: {}", host, e),
        }
    }
}
