//! Host-identity matching over an acquired certificate.
//!
//! Reproduces standard TLS server-identity verification (RFC 6125 style) as a
//! pure function, so it can be exercised without a network and reported
//! independently of chain validation. A non-matching certificate is a `false`
//! result, never an error.
//!
//! Rules, in order:
//! 1. An IP-literal identity matches only SAN iPAddress entries, compared as
//!    parsed addresses. Wildcards and the CN never apply to IP literals.
//! 2. For DNS names, the candidate set is the SAN dNSName entries when a SAN
//!    extension is present; the CN is consulted only when it is not.
//! 3. Exact matches are ASCII case-insensitive; trailing dots are ignored.
//! 4. A wildcard must be the entire leftmost label (`*.example.com`), must
//!    keep at least two labels after it (a bare `*` or `*.com` is rejected as
//!    over-broad), and matches exactly one additional label.

use crate::CertificateRecord;
use std::net::IpAddr;

/// Decides whether `record` legitimately represents `expected_identity`, the
/// hostname or IP literal originally requested.
pub fn matches_identity(record: &CertificateRecord, expected_identity: &str) -> bool {
    let expected = expected_identity.trim();
    if expected.is_empty() {
        return false;
    }

    if let Ok(expected_ip) = expected.parse::<IpAddr>() {
        return record
            .san_ip_addresses
            .iter()
            .any(|entry| entry.parse::<IpAddr>().map_or(false, |san| san == expected_ip));
    }

    if record.has_san_entries() {
        record
            .san_dns_names
            .iter()
            .any(|pattern| dns_name_matches(expected, pattern))
    } else {
        // Legacy CN fallback, only without a SAN extension.
        record
            .common_name
            .as_deref()
            .map_or(false, |cn| dns_name_matches(expected, cn))
    }
}

fn dns_name_matches(expected: &str, pattern: &str) -> bool {
    let expected = expected.strip_suffix('.').unwrap_or(expected);
    let pattern = pattern.strip_suffix('.').unwrap_or(pattern);
    if pattern.eq_ignore_ascii_case(expected) {
        return true;
    }
    wildcard_matches(expected, pattern)
}

/// Single-label wildcard match: `*.example.com` covers `www.example.com` but
/// not `example.com` and not `a.b.example.com`.
fn wildcard_matches(expected: &str, pattern: &str) -> bool {
    let base = match pattern.strip_prefix("*.") {
        Some(base) => base,
        None => return false,
    };
    // The wildcard must not sit at a public-suffix boundary.
    if !base.contains('.') {
        return false;
    }
    match expected.split_once('.') {
        Some((label, rest)) => {
            !label.is_empty() && !label.contains('*') && rest.eq_ignore_ascii_case(base)
        }
        None => false,
    }
}
