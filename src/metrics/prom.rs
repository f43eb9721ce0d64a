use lazy_static::lazy_static;
use prometheus::{labels, register_gauge, Gauge};

use crate::CheckResult;

lazy_static! {
    static ref CERTWATCH_DAYS_REMAINING: Gauge = register_gauge!(
        "certwatch_days_remaining",
        "whole days until certificate expiry"
    )
    .unwrap();
    static ref CERTWATCH_EXPIRING: Gauge = register_gauge!(
        "certwatch_expiring",
        "certificate is inside the expiry warning window"
    )
    .unwrap();
    static ref CERTWATCH_IDENTITY_MATCH: Gauge = register_gauge!(
        "certwatch_identity_match",
        "certificate matches the requested host identity"
    )
    .unwrap();
    static ref CERTWATCH_CHECK_ERROR: Gauge = register_gauge!(
        "certwatch_check_error",
        "certificate acquisition or parsing failed"
    )
    .unwrap();
}

fn gauge_value(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Pushes one set of gauges per check result to a Prometheus Push Gateway.
/// # Arguments
/// * `results` - Slice of CheckResult values
/// * `gateway_address` - Push Gateway address, e.g. "http://localhost:9091"
pub fn push_check_metrics(results: &[CheckResult], gateway_address: &str) {
    for result in results.iter() {
        CERTWATCH_DAYS_REMAINING.set(result.days_remaining.unwrap_or(0) as f64);
        CERTWATCH_EXPIRING.set(gauge_value(result.expiring == Some(true)));
        CERTWATCH_IDENTITY_MATCH.set(gauge_value(result.identity_matched == Some(true)));
        CERTWATCH_CHECK_ERROR.set(gauge_value(result.error.is_some()));

        let error_kind = result
            .error
            .as_ref()
            .map(|report| report.kind.to_string())
            .unwrap_or_else(|| "None".to_string());

        let metric_families = prometheus::gather();
        let prometheus_client = prometheus::push_metrics(
            "certwatch",
            labels! {
                "instance".to_owned() => "certwatch".to_owned(),
                "job".to_owned() => "certwatch".to_owned(),
                "host".to_owned() => result.host.to_owned(),
                "port".to_owned() => result.port.to_string(),
                "error".to_owned() => error_kind,
            },
            &format!("{}/metrics/job", gateway_address),
            metric_families,
            None,
        );

        match prometheus_client {
            Ok(_) => {}
            Err(e) => eprintln!("Failed to push metrics to prometheus: {}", e),
        }
    }
}
