//! certwatch command-line interface.
//!
//! Fans one thread out per configured host, collects the per-host results
//! over a channel, prints them in the selected format, and signals overall
//! health through the exit status so a scheduler can alert on it.

use clap::Parser;
use comfy_table::Table;
use std::path::PathBuf;
use std::process::exit;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use strum_macros::{Display, EnumString};

use certwatch::config::Config;
use certwatch::metrics::prom::push_check_metrics;
use certwatch::{check_host, CheckOptions, CheckResult, CheckTarget, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(
    name = "certwatch",
    version,
    about = "TLS certificate expiry and host-identity health checks"
)]
struct Cli {
    /// Host to check, as HOST, HOST:PORT, or URL; repeatable
    #[arg(short = 'H', long = "host", value_name = "HOST[:PORT]")]
    hosts: Vec<String>,

    /// Flag certificates expiring within this many days
    #[arg(short = 'w', long, value_name = "DAYS")]
    warning_days: Option<u32>,

    /// Connect + handshake timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output format: json, text, summary
    #[arg(short, long)]
    output: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exit code to use when any host is unhealthy
    #[arg(long, value_name = "CODE")]
    exit_code: Option<i32>,

    /// Push results to a Prometheus Push Gateway
    #[arg(long)]
    prometheus: bool,

    /// Prometheus push gateway address
    #[arg(long, value_name = "URL")]
    prometheus_address: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum OutputFormat {
    Json,
    Text,
    Summary,
}

fn main() {
    let cli = Cli::parse();

    if cli.init_config {
        println!("{}", Config::example_toml());
        return;
    }

    let mut config = Config::default();
    if let Some(path) = &cli.config {
        match Config::from_file(path) {
            Ok(file_config) => config = config.merge_with(file_config),
            Err(e) => {
                eprintln!("Failed to load config file {}: {}", path.display(), e);
                exit(2);
            }
        }
    }

    let cli_hosts = if cli.hosts.is_empty() {
        None
    } else {
        Some(cli.hosts.clone())
    };
    config = config.merge_with(Config::from_cli_args(
        cli_hosts,
        cli.warning_days,
        cli.timeout,
        cli.output.clone(),
        cli.exit_code,
        if cli.prometheus { Some(true) } else { None },
        cli.prometheus_address.clone(),
    ));

    let hosts = match &config.hosts {
        Some(hosts) if !hosts.is_empty() => hosts.clone(),
        _ => {
            eprintln!("No hosts to check. Pass --host or set 'hosts' in the config file.");
            exit(2);
        }
    };

    let format_name = config
        .output
        .clone()
        .unwrap_or_else(|| "summary".to_string());
    let format = match OutputFormat::from_str(&format_name) {
        Ok(format) => format,
        Err(_) => {
            eprintln!(
                "Unknown output format '{}'. Expected json, text, or summary.",
                format_name
            );
            exit(2);
        }
    };

    let results = run_checks(&hosts, &config);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results).unwrap());
        }
        OutputFormat::Text => print_text(&results),
        OutputFormat::Summary => print_summary(&results),
    }

    if let Some(prom) = &config.prometheus {
        if prom.enabled == Some(true) {
            let address = prom
                .address
                .clone()
                .unwrap_or_else(|| "http://localhost:9091".to_string());
            push_check_metrics(&results, &address);
        }
    }

    if results.iter().all(CheckResult::is_healthy) {
        exit(0);
    }
    exit(config.exit_code.unwrap_or(1));
}

/// Runs every check on its own thread. A host that fails to parse, resolve,
/// connect, or verify becomes a failed result; it never stops the batch.
fn run_checks(hosts: &[String], config: &Config) -> Vec<CheckResult> {
    let timeout = Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let (sender, receiver) = mpsc::channel();

    for spec in hosts {
        match CheckTarget::parse(spec) {
            Ok(target) => {
                let options = CheckOptions {
                    timeout,
                    warning_days: config.warning_days_for(&target.host),
                };
                let thread_tx = sender.clone();
                thread::spawn(move || {
                    let _ = thread_tx.send(check_host(&target, &options));
                });
            }
            Err(err) => {
                let _ = sender.send(CheckResult::failed(spec, 0, &err));
            }
        }
    }
    // Drop the original sender so the receiver knows when all threads are done
    drop(sender);

    let mut results: Vec<CheckResult> = receiver.iter().collect();
    results.sort_by(|a, b| (a.host.as_str(), a.port).cmp(&(b.host.as_str(), b.port)));
    results
}

fn print_text(results: &[CheckResult]) {
    for result in results {
        println!("--------------------------------------");
        println!("Host: {}:{}", result.host, result.port);
        match &result.error {
            Some(report) => {
                println!("Check failed ({}): {}", report.kind, report.message);
            }
            None => {
                println!("Valid to: {}", result.valid_to.as_deref().unwrap_or("unknown"));
                println!("Days left: {}", result.days_remaining.unwrap_or(0));
                println!("Expiring soon: {}", result.expiring == Some(true));
                println!("Identity match: {}", result.identity_matched == Some(true));
                println!("Subject identities:");
                for identity in &result.subject_identities {
                    println!("\t{}", identity);
                }
            }
        }
    }
}

fn print_summary(results: &[CheckResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Host",
        "Port",
        "Status",
        "Days Left",
        "Identity",
        "Detail",
    ]);
    for result in results {
        match &result.error {
            Some(report) => {
                table.add_row(vec![
                    result.host.clone(),
                    result.port.to_string(),
                    "ERROR".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    report.kind.to_string(),
                ]);
            }
            None => {
                let status = if result.expiring == Some(true) {
                    "EXPIRING"
                } else {
                    "OK"
                };
                let identity = if result.identity_matched == Some(true) {
                    "match"
                } else {
                    "MISMATCH"
                };
                table.add_row(vec![
                    result.host.clone(),
                    result.port.to_string(),
                    status.to_string(),
                    result.days_remaining.unwrap_or(0).to_string(),
                    identity.to_string(),
                    result.valid_to.clone().unwrap_or_default(),
                ]);
            }
        }
    }
    println!("{table}");
}
