//! Basic certificate checking example.
//!
//! This example demonstrates how to perform a single TLS certificate health
//! check: acquire the leaf certificate, evaluate the expiry window, and match
//! the host identity.
//!
//! Run with: cargo run --example basic_check

use certwatch::{check_host, CheckOptions, CheckTarget};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Basic Certificate Health Check ===\n");

    let target = CheckTarget::parse("google.com")?;
    let result = check_host(&target, &CheckOptions::default());

    println!("Host: {}:{}", result.host, result.port);

    if let Some(report) = &result.error {
        println!("Check failed ({}): {}", report.kind, report.message);
        return Ok(());
    }

    println!("Valid to: {}", result.valid_to.as_deref().unwrap_or("unknown"));
    println!("Days remaining: {}", result.days_remaining.unwrap_or(0));
    println!("Expiring soon: {}", result.expiring == Some(true));
    println!("Identity match: {}", result.identity_matched == Some(true));
    println!("Healthy: {}", result.is_healthy());
    println!();

    println!("Subject identities:");
    for identity in &result.subject_identities {
        println!("  - {}", identity);
    }

    Ok(())
}
