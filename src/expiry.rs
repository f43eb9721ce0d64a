//! Expiry-window evaluation.
//!
//! Classifies an acquired certificate against a warning window. "Expiring" is
//! a returned value, never a failure: a certificate that is already past its
//! `notAfter` is the degenerate case of "expiring within N days" and gets the
//! same classification. Only an unparseable timestamp is an error, and that is
//! caught upstream during acquisition; a record that reaches this module
//! always carries a valid `not_after`.

use crate::{CertificateRecord, SECS_PER_DAY};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Expiry classification of one certificate at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    /// True when `now >= not_after - warning_days` (inclusive boundary)
    pub expiring: bool,
    /// Whole days until `not_after`; negative once expired
    pub days_remaining: i64,
}

impl ExpiryStatus {
    /// Evaluates `record` against a warning window of `warning_days` days,
    /// sampling the wall clock exactly once.
    pub fn evaluate(record: &CertificateRecord, warning_days: u32) -> Self {
        Self::evaluate_at(record.not_after, warning_days, unix_now())
    }

    /// Deterministic core of [`evaluate`](Self::evaluate): all instants are
    /// Unix seconds UTC supplied by the caller.
    pub fn evaluate_at(not_after: i64, warning_days: u32, now: i64) -> Self {
        let threshold = not_after - i64::from(warning_days) * SECS_PER_DAY;
        ExpiryStatus {
            expiring: now >= threshold,
            days_remaining: (not_after - now).div_euclid(SECS_PER_DAY),
        }
    }
}

/// Current wall-clock time as Unix seconds UTC.
pub(crate) fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        // Clock set before the epoch; still a usable instant.
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000;

    #[test]
    fn test_outside_window_is_not_expiring() {
        // 40 days out, 14-day window
        let status = ExpiryStatus::evaluate_at(NOW + 40 * SECS_PER_DAY, 14, NOW);
        assert!(!status.expiring);
        assert_eq!(status.days_remaining, 40);
    }

    #[test]
    fn test_inside_window_is_expiring() {
        // 10 days out, 14-day window
        let status = ExpiryStatus::evaluate_at(NOW + 10 * SECS_PER_DAY, 14, NOW);
        assert!(status.expiring);
        assert_eq!(status.days_remaining, 10);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let not_after = NOW + 14 * SECS_PER_DAY;
        let at_threshold = ExpiryStatus::evaluate_at(not_after, 14, NOW);
        assert!(at_threshold.expiring);

        let just_before = ExpiryStatus::evaluate_at(not_after, 14, NOW - 1);
        assert!(!just_before.expiring);
    }

    #[test]
    fn test_already_expired_is_expiring_for_any_window() {
        let not_after = NOW - 3 * SECS_PER_DAY;
        for warning_days in [0, 1, 14, 365] {
            let status = ExpiryStatus::evaluate_at(not_after, warning_days, NOW);
            assert!(status.expiring);
            assert_eq!(status.days_remaining, -3);
        }
    }

    #[test]
    fn test_days_remaining_floors_toward_negative_infinity() {
        // 1.5 days out floors to 1
        let status = ExpiryStatus::evaluate_at(NOW + SECS_PER_DAY + SECS_PER_DAY / 2, 0, NOW);
        assert_eq!(status.days_remaining, 1);

        // Expired half a day ago floors to -1, not 0
        let status = ExpiryStatus::evaluate_at(NOW - SECS_PER_DAY / 2, 0, NOW);
        assert_eq!(status.days_remaining, -1);
    }

    #[test]
    fn test_days_remaining_is_monotone_in_time() {
        let not_after = NOW + 30 * SECS_PER_DAY;
        let mut previous = i64::MAX;
        for offset in (0..60 * SECS_PER_DAY).step_by((6 * 3600) as usize) {
            let status = ExpiryStatus::evaluate_at(not_after, 14, NOW + offset);
            assert!(status.days_remaining <= previous);
            previous = status.days_remaining;
        }
    }

    #[test]
    fn test_zero_warning_days_flags_only_at_expiry() {
        let not_after = NOW + SECS_PER_DAY;
        assert!(!ExpiryStatus::evaluate_at(not_after, 0, NOW).expiring);
        assert!(ExpiryStatus::evaluate_at(not_after, 0, not_after).expiring);
    }
}
