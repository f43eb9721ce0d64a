//! Error types for certificate health checks.
//!
//! This module defines the error taxonomy for certificate acquisition and
//! parsing. Every kind is recoverable at the per-host level: a failing host
//! yields a `CheckResult` carrying a [`FailureReport`] while the rest of the
//! batch continues. Two conditions are deliberately *not* errors: a
//! certificate inside the expiry warning window and a host-identity mismatch
//! are both ordinary check outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use strum_macros::Display;

/// Error type for certificate acquisition and parsing failures.
///
/// Variants keep enough detail (host, port, underlying cause) for a consuming
/// logging or alerting collaborator to act on.
#[derive(Debug)]
pub enum CheckError {
    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        host: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The connection or handshake did not complete within the timeout
    Timeout {
        /// The address (host:port) being checked when the bound was hit
        address: String,
    },

    /// TLS handshake failed (protocol error, untrusted chain)
    TlsFailure {
        /// Details about why the handshake failed
        details: String,
    },

    /// Handshake completed but the peer presented no certificate
    NoCertificate {
        /// The host that presented no certificate
        host: String,
    },

    /// The certificate's expiry timestamp could not be parsed
    MalformedExpiry {
        /// Why the `notAfter` field could not be converted to an instant
        reason: String,
    },

    /// Invalid input provided to the API
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
}

/// Coarse classification of a [`CheckError`], stable across releases and
/// suitable for metric labels and structured result payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ErrorKind {
    DnsResolution,
    ConnectionFailed,
    Timeout,
    TlsFailure,
    NoCertificate,
    MalformedExpiry,
    InvalidInput,
}

/// Serializable summary of a failed check, embedded in `CheckResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Which kind of failure occurred
    pub kind: ErrorKind,
    /// Human-readable description including host/port context
    pub message: String,
}

impl CheckError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DnsResolution { .. } => ErrorKind::DnsResolution,
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TlsFailure { .. } => ErrorKind::TlsFailure,
            Self::NoCertificate { .. } => ErrorKind::NoCertificate,
            Self::MalformedExpiry { .. } => ErrorKind::MalformedExpiry,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// Converts this error into the serializable form carried by `CheckResult`.
    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { host, .. } => {
                write!(
                    f,
                    "Failed to resolve hostname: {}. Check that the hostname is spelled correctly and your DNS configuration is working.",
                    host
                )
            }
            Self::ConnectionFailed { address, .. } => {
                write!(
                    f,
                    "Connection failed to: {}. Verify the host is running a TLS service and is reachable.",
                    address
                )
            }
            Self::Timeout { address } => {
                write!(f, "Connection to {} timed out", address)
            }
            Self::TlsFailure { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::NoCertificate { host } => {
                write!(
                    f,
                    "Handshake with {} completed but no peer certificate was presented",
                    host
                )
            }
            Self::MalformedExpiry { reason } => {
                write!(f, "Could not parse certificate expiry (notAfter): {}", reason)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::TlsFailure {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CheckError::InvalidInput {
            field: "host".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid input for 'host': cannot be empty");
    }

    #[test]
    fn test_error_kinds() {
        let err = CheckError::Timeout {
            address: "example.com:443".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = CheckError::MalformedExpiry {
            reason: "bad ASN.1 time".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::MalformedExpiry);
    }

    #[test]
    fn test_failure_report_carries_context() {
        let err = CheckError::NoCertificate {
            host: "example.com".to_string(),
        };
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::NoCertificate);
        assert!(report.message.contains("example.com"));
    }

    #[test]
    fn test_error_kind_display_is_stable() {
        assert_eq!(ErrorKind::TlsFailure.to_string(), "TlsFailure");
        assert_eq!(ErrorKind::DnsResolution.to_string(), "DnsResolution");
    }
}
