//! Custom warning-window example.
//!
//! This example checks the same host against several warning windows to show
//! how the expiry classification shifts: a certificate 40 days from expiry is
//! healthy under a 14-day window but flagged under a 60-day one.
//!
//! Run with: cargo run --example custom_warning_window

use certwatch::{check_host, CheckOptions, CheckTarget};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = CheckTarget::parse("rust-lang.org:443")?;

    for warning_days in [7, 14, 30, 60] {
        let options = CheckOptions {
            timeout: Duration::from_secs(10),
            warning_days,
        };
        let result = check_host(&target, &options);

        match &result.error {
            Some(report) => {
                println!("{}: check failed: {}", target, report.message);
                break;
            }
            None => {
                println!(
                    "{}: window={:>2} days, remaining={} days, expiring={}",
                    target,
                    warning_days,
                    result.days_remaining.unwrap_or(0),
                    result.expiring == Some(true),
                );
            }
        }
    }

    Ok(())
}
