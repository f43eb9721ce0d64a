//! Point-in-time TLS certificate health checks.
//!
//! certwatch connects to a remote TLS endpoint, retrieves the peer's leaf
//! certificate, and answers two questions about it: does it expire within a
//! configurable warning window, and does it legitimately represent the host
//! that was asked for. Chain-of-trust validation is left to OpenSSL's default
//! verification; hostname binding is deliberately *not* done by the transport
//! layer so it can be evaluated and tested as a separate, pure step (see
//! [`identity`]).
//!
//! Each check is stateless and self-contained: acquire a [`CertificateRecord`]
//! over one bounded network operation, evaluate it, report a [`CheckResult`],
//! and drop everything. Checks for different hosts are independent and safe to
//! run concurrently.
//!
//! ```no_run
//! use certwatch::{check_host, CheckOptions, CheckTarget};
//!
//! let target = CheckTarget::parse("example.com:443")?;
//! let result = check_host(&target, &CheckOptions::default());
//! if !result.is_healthy() {
//!     eprintln!("{}: needs attention", result.host);
//! }
//! # Ok::<(), certwatch::CheckError>(())
//! ```

pub mod config;
pub mod error;
pub mod expiry;
pub mod identity;
pub mod metrics;

pub use error::{CheckError, ErrorKind, FailureReport};
pub use expiry::ExpiryStatus;

use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::ssl::{HandshakeError, Ssl, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::{X509Ref, X509VerifyResult};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use url::Url;

/// Default bound on the connect + handshake, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default expiry warning window, in days.
pub const DEFAULT_WARNING_DAYS: u32 = 14;
/// Port assumed when a target spec names none.
pub const DEFAULT_PORT: u16 = 443;

const SECS_PER_DAY: i64 = 86_400;

/// One host:port pair to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTarget {
    /// DNS name or IP literal
    pub host: String,
    /// TCP port, 1-65535
    pub port: u16,
}

impl CheckTarget {
    /// Builds a target from an already-split host and port.
    pub fn new(host: &str, port: u16) -> Result<Self, CheckError> {
        if host.is_empty() {
            return Err(CheckError::InvalidInput {
                field: "host".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if port == 0 {
            return Err(CheckError::InvalidInput {
                field: "port".to_string(),
                reason: "must be between 1 and 65535".to_string(),
            });
        }
        Ok(CheckTarget {
            host: host.to_string(),
            port,
        })
    }

    /// Parses a target spec as it appears in config files and on the command
    /// line: `example.com`, `example.com:8443`, `https://example.com:9443`,
    /// `192.0.2.1`, `[2001:db8::1]:443`. The port defaults to 443.
    pub fn parse(spec: &str) -> Result<Self, CheckError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(CheckError::InvalidInput {
                field: "host".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if spec.contains("://") {
            let url = Url::parse(spec).map_err(|e| CheckError::InvalidInput {
                field: "host".to_string(),
                reason: format!("'{}' is not a valid URL: {}", spec, e),
            })?;
            let host = url.host_str().ok_or_else(|| CheckError::InvalidInput {
                field: "host".to_string(),
                reason: format!("'{}' has no host component", spec),
            })?;
            let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);
            return CheckTarget::new(strip_brackets(host), port);
        }

        // A bare IPv6 literal contains colons but no port.
        if spec.parse::<IpAddr>().is_ok() {
            return CheckTarget::new(spec, DEFAULT_PORT);
        }

        if let Some((host, port)) = spec.rsplit_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                return CheckTarget::new(strip_brackets(host), port);
            }
        }

        CheckTarget::new(spec, DEFAULT_PORT)
    }
}

impl std::fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Immutable snapshot of one TLS peer certificate, taken from live handshake
/// data. Created exactly once per check and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// The hostname or IP literal the check targeted
    pub host: String,
    /// The port the check targeted
    pub port: u16,
    /// Subject Common Name, when present
    pub common_name: Option<String>,
    /// Subject Alternative Name dNSName entries
    pub san_dns_names: Vec<String>,
    /// Subject Alternative Name iPAddress entries, textual form
    pub san_ip_addresses: Vec<String>,
    /// Start of the validity window, Unix seconds UTC; `None` if unparseable
    pub not_before: Option<i64>,
    /// End of the validity window, Unix seconds UTC
    pub not_after: i64,
    /// `notBefore` in its ASN.1 textual form, for display
    pub valid_from: String,
    /// `notAfter` in its ASN.1 textual form, for display
    pub valid_to: String,
}

impl CertificateRecord {
    /// Acquires the peer certificate of `host:port`.
    ///
    /// Opens a TCP connection bounded by `timeout`, performs a TLS handshake
    /// with OpenSSL's default trust-root verification for chain validity, and
    /// extracts the leaf certificate. Hostname-to-certificate binding is *not*
    /// checked here; that is [`identity::matches_identity`]'s job. The
    /// connection is shut down on every exit path.
    pub fn acquire(host: &str, port: u16, timeout: Duration) -> Result<Self, CheckError> {
        let target = CheckTarget::new(host, port)?;
        let address = target.to_string();

        let socket_addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| CheckError::DnsResolution {
                host: host.to_string(),
                source: e,
            })?
            .next()
            .ok_or_else(|| CheckError::DnsResolution {
                host: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
            })?;

        let tcp_stream = TcpStream::connect_timeout(&socket_addr, timeout)
            .map_err(|e| connect_error(&address, e))?;
        tcp_stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| connect_error(&address, e))?;
        tcp_stream
            .set_write_timeout(Some(timeout))
            .map_err(|e| connect_error(&address, e))?;

        // Chain validity is enforced by OpenSSL against the platform trust
        // roots; hostname verification stays out of the handshake on purpose.
        let mut builder = SslContext::builder(SslMethod::tls())?;
        builder.set_default_verify_paths()?;
        builder.set_verify(SslVerifyMode::PEER);
        let context = builder.build();

        let mut ssl = Ssl::new(&context)?;
        // SNI carries DNS names only; IP literals must not be sent.
        if host.parse::<IpAddr>().is_err() {
            ssl.set_hostname(host)?;
        }

        let mut stream = ssl
            .connect(tcp_stream)
            .map_err(|e| handshake_error(&address, e))?;

        let record = match stream.ssl().peer_certificate() {
            Some(cert) => CertificateRecord::from_x509(host, port, &cert),
            None => Err(CheckError::NoCertificate {
                host: host.to_string(),
            }),
        };

        let _ = stream.shutdown();
        record
    }

    fn from_x509(host: &str, port: u16, cert: &X509Ref) -> Result<Self, CheckError> {
        let common_name = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|name| name.to_string());

        let mut san_dns_names = Vec::new();
        let mut san_ip_addresses = Vec::new();
        if let Some(names) = cert.subject_alt_names() {
            for name in names.iter() {
                if let Some(dns) = name.dnsname() {
                    san_dns_names.push(dns.to_string());
                } else if let Some(ip) = name.ipaddress().and_then(ip_from_der_bytes) {
                    san_ip_addresses.push(ip.to_string());
                }
            }
        }

        // An unparseable notAfter must surface as an error, never as a
        // certificate that silently looks far-future or already expired.
        let not_after =
            asn1_time_to_unix(cert.not_after()).map_err(|e| CheckError::MalformedExpiry {
                reason: e.to_string(),
            })?;
        let not_before = asn1_time_to_unix(cert.not_before()).ok();

        Ok(CertificateRecord {
            host: host.to_string(),
            port,
            common_name,
            san_dns_names,
            san_ip_addresses,
            not_before,
            not_after,
            valid_from: cert.not_before().to_string(),
            valid_to: cert.not_after().to_string(),
        })
    }

    /// True when the certificate carries a SAN extension (any DNS or IP
    /// entry). Modern matching ignores the CN in that case.
    pub fn has_san_entries(&self) -> bool {
        !self.san_dns_names.is_empty() || !self.san_ip_addresses.is_empty()
    }

    /// Every identity the certificate claims: CN plus all SAN entries.
    pub fn subject_identities(&self) -> Vec<String> {
        let mut identities: Vec<String> = self.common_name.iter().cloned().collect();
        identities.extend(self.san_dns_names.iter().cloned());
        identities.extend(self.san_ip_addresses.iter().cloned());
        identities
    }
}

/// Converts an ASN.1 time to Unix seconds by diffing against the epoch.
fn asn1_time_to_unix(time: &Asn1TimeRef) -> Result<i64, openssl::error::ErrorStack> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    Ok(i64::from(diff.days) * SECS_PER_DAY + i64::from(diff.secs))
}

fn ip_from_der_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(bytes).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

fn connect_error(address: &str, err: io::Error) -> CheckError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => CheckError::Timeout {
            address: address.to_string(),
        },
        _ => CheckError::ConnectionFailed {
            address: address.to_string(),
            source: err,
        },
    }
}

fn handshake_error<S>(address: &str, err: HandshakeError<S>) -> CheckError {
    match &err {
        HandshakeError::SetupFailure(stack) => CheckError::TlsFailure {
            details: stack.to_string(),
        },
        HandshakeError::Failure(mid) | HandshakeError::WouldBlock(mid) => {
            if let Some(io_err) = mid.error().io_error() {
                if matches!(
                    io_err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
                ) {
                    return CheckError::Timeout {
                        address: address.to_string(),
                    };
                }
            }
            let verify = mid.ssl().verify_result();
            let details = if verify == X509VerifyResult::OK {
                mid.error().to_string()
            } else {
                format!("{} ({})", mid.error(), verify.error_string())
            };
            CheckError::TlsFailure { details }
        }
    }
}

/// Knobs for one check.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Bound on connect + handshake
    pub timeout: Duration,
    /// Expiry warning window in days
    pub warning_days: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            warning_days: DEFAULT_WARNING_DAYS,
        }
    }
}

/// Outcome of checking one host.
///
/// Exactly one of the two shapes occurs: either `error` is set and the
/// evaluation fields are absent (no certificate was acquired), or `error` is
/// absent and all evaluation fields are present. The [`CheckResult::passed`]
/// and [`CheckResult::failed`] constructors are the only way results are
/// built, which keeps that invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// The hostname or IP literal the check targeted
    pub host: String,
    /// The port the check targeted
    pub port: u16,
    /// True when the certificate expires within the warning window
    /// (including already expired)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiring: Option<bool>,
    /// Whole days until expiry; negative once expired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// True when the certificate legitimately represents the requested host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_matched: Option<bool>,
    /// Set when acquisition or parsing failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,
    /// SAN entries plus CN, for reporting; empty on failure
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subject_identities: Vec<String>,
    /// Expiry instant in ASN.1 textual form, for reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
}

impl CheckResult {
    /// Result for a successfully acquired and evaluated certificate.
    pub fn passed(record: &CertificateRecord, status: ExpiryStatus, identity_matched: bool) -> Self {
        CheckResult {
            host: record.host.clone(),
            port: record.port,
            expiring: Some(status.expiring),
            days_remaining: Some(status.days_remaining),
            identity_matched: Some(identity_matched),
            error: None,
            subject_identities: record.subject_identities(),
            valid_to: Some(record.valid_to.clone()),
        }
    }

    /// Result for a check that produced no certificate record.
    pub fn failed(host: &str, port: u16, error: &CheckError) -> Self {
        CheckResult {
            host: host.to_string(),
            port,
            expiring: None,
            days_remaining: None,
            identity_matched: None,
            error: Some(error.report()),
            subject_identities: Vec::new(),
            valid_to: None,
        }
    }

    /// True only when the certificate was acquired, is outside the warning
    /// window, and matches the requested identity.
    pub fn is_healthy(&self) -> bool {
        self.error.is_none() && self.expiring == Some(false) && self.identity_matched == Some(true)
    }
}

/// Runs one complete check: acquire the certificate, evaluate expiry, and
/// match the host identity. Never panics and never aborts a batch; every
/// outcome, including acquisition failure, becomes a [`CheckResult`].
pub fn check_host(target: &CheckTarget, options: &CheckOptions) -> CheckResult {
    match CertificateRecord::acquire(&target.host, target.port, options.timeout) {
        Ok(record) => {
            let status = ExpiryStatus::evaluate(&record, options.warning_days);
            let matched = identity::matches_identity(&record, &target.host);
            CheckResult::passed(&record, status, matched)
        }
        Err(err) => CheckResult::failed(&target.host, target.port, &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(san_dns: &[&str]) -> CertificateRecord {
        CertificateRecord {
            host: "example.com".to_string(),
            port: 443,
            common_name: Some("example.com".to_string()),
            san_dns_names: san_dns.iter().map(|s| s.to_string()).collect(),
            san_ip_addresses: Vec::new(),
            not_before: Some(0),
            not_after: 4_102_444_800, // 2100-01-01
            valid_from: "Jan  1 00:00:00 1970 GMT".to_string(),
            valid_to: "Jan  1 00:00:00 2100 GMT".to_string(),
        }
    }

    #[test]
    fn test_parse_bare_host() {
        let target = CheckTarget::parse("example.com").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 443);
    }

    #[test]
    fn test_parse_host_with_port() {
        let target = CheckTarget::parse("example.com:8443").unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_parse_https_url() {
        let target = CheckTarget::parse("https://secure.example.com:9443").unwrap();
        assert_eq!(target.host, "secure.example.com");
        assert_eq!(target.port, 9443);

        let target = CheckTarget::parse("https://secure.example.com").unwrap();
        assert_eq!(target.port, 443);
    }

    #[test]
    fn test_parse_ip_literals() {
        let target = CheckTarget::parse("192.0.2.1").unwrap();
        assert_eq!(target.host, "192.0.2.1");
        assert_eq!(target.port, 443);

        let target = CheckTarget::parse("2001:db8::1").unwrap();
        assert_eq!(target.host, "2001:db8::1");
        assert_eq!(target.port, 443);

        let target = CheckTarget::parse("[2001:db8::1]:8443").unwrap();
        assert_eq!(target.host, "2001:db8::1");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_parse_rejects_empty_and_port_zero() {
        assert!(matches!(
            CheckTarget::parse(""),
            Err(CheckError::InvalidInput { .. })
        ));
        assert!(matches!(
            CheckTarget::parse("example.com:0"),
            Err(CheckError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_asn1_time_round_trip() {
        let unix = 1_700_000_000;
        let time = Asn1Time::from_unix(unix).unwrap();
        assert_eq!(asn1_time_to_unix(&time).unwrap(), unix);

        let epoch = Asn1Time::from_unix(0).unwrap();
        assert_eq!(asn1_time_to_unix(&epoch).unwrap(), 0);
    }

    #[test]
    fn test_ip_from_der_bytes() {
        assert_eq!(
            ip_from_der_bytes(&[192, 0, 2, 1]),
            Some("192.0.2.1".parse().unwrap())
        );
        let v6 = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        assert_eq!(ip_from_der_bytes(&v6), Some("2001:db8::1".parse().unwrap()));
        assert_eq!(ip_from_der_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn test_connect_error_classification() {
        let timeout = connect_error(
            "example.com:443",
            io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        );
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let refused = connect_error(
            "example.com:443",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert_eq!(refused.kind(), ErrorKind::ConnectionFailed);
    }

    #[test]
    fn test_result_invariant() {
        let rec = record(&["example.com"]);
        let status = ExpiryStatus::evaluate(&rec, DEFAULT_WARNING_DAYS);
        let passed = CheckResult::passed(&rec, status, true);
        assert!(passed.error.is_none());
        assert!(passed.expiring.is_some());
        assert!(passed.days_remaining.is_some());
        assert!(passed.identity_matched.is_some());
        assert!(passed.is_healthy());

        let err = CheckError::Timeout {
            address: "example.com:443".to_string(),
        };
        let failed = CheckResult::failed("example.com", 443, &err);
        assert!(failed.error.is_some());
        assert!(failed.expiring.is_none());
        assert!(failed.days_remaining.is_none());
        assert!(failed.identity_matched.is_none());
        assert!(!failed.is_healthy());
    }

    #[test]
    fn test_unhealthy_when_identity_mismatch() {
        let rec = record(&["other.example.net"]);
        let status = ExpiryStatus::evaluate(&rec, DEFAULT_WARNING_DAYS);
        let result = CheckResult::passed(&rec, status, false);
        assert!(result.error.is_none());
        assert!(!result.is_healthy());
    }

    #[test]
    fn test_subject_identities_collects_cn_and_sans() {
        let mut rec = record(&["example.com", "www.example.com"]);
        rec.san_ip_addresses.push("192.0.2.1".to_string());
        let identities = rec.subject_identities();
        assert_eq!(
            identities,
            vec!["example.com", "example.com", "www.example.com", "192.0.2.1"]
        );
        assert!(rec.has_san_entries());
    }

    #[test]
    fn test_failed_result_serializes_without_evaluation_fields() {
        let err = CheckError::TlsFailure {
            details: "self signed certificate".to_string(),
        };
        let failed = CheckResult::failed("example.com", 443, &err);
        let json = serde_json::to_value(&failed).unwrap();
        assert!(json.get("expiring").is_none());
        assert!(json.get("days_remaining").is_none());
        assert_eq!(json["error"]["kind"], "TlsFailure");
    }
}
