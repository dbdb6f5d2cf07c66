//! Time-window check for periodic reconciliation.

use chrono::{DateTime, Duration, Utc};

use crate::types::RevalidateFrequency;

impl RevalidateFrequency {
    /// Length of the window.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
            Self::OneDay => Duration::days(1),
            Self::TwoDays => Duration::days(2),
            Self::SevenDays => Duration::days(7),
        }
    }
}

/// Whether a revalidation pass is due now.
#[must_use]
pub fn needs_revalidation(last: Option<DateTime<Utc>>, frequency: RevalidateFrequency) -> bool {
    needs_revalidation_at(last, frequency, Utc::now())
}

/// Whether a revalidation pass is due at `now`.
///
/// Due when there is no previous pass, when more than one window has elapsed,
/// or when `last` lies in the future (clock skew or a hand-edited value).
#[must_use]
pub fn needs_revalidation_at(
    last: Option<DateTime<Utc>>,
    frequency: RevalidateFrequency,
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last else {
        return true;
    };
    if last > now {
        return true;
    }
    now.signed_duration_since(last) > frequency.duration()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_never_revalidated_is_due() {
        assert!(needs_revalidation_at(
            None,
            RevalidateFrequency::SevenDays,
            at("2026-03-01T00:00:00Z")
        ));
    }

    #[test]
    fn test_within_window_not_due() {
        let now = at("2026-03-03T00:00:00Z");
        assert!(!needs_revalidation_at(
            Some(at("2026-03-01T12:00:00Z")),
            RevalidateFrequency::TwoDays,
            now
        ));
    }

    #[test]
    fn test_exact_boundary_not_due() {
        let now = at("2026-03-02T00:00:00Z");
        assert!(!needs_revalidation_at(
            Some(at("2026-03-01T00:00:00Z")),
            RevalidateFrequency::OneDay,
            now
        ));
    }

    #[test]
    fn test_past_window_due() {
        let now = at("2026-03-01T01:00:01Z");
        assert!(needs_revalidation_at(
            Some(at("2026-03-01T00:00:00Z")),
            RevalidateFrequency::OneHour,
            now
        ));
    }

    #[test]
    fn test_future_timestamp_due() {
        let now = at("2026-03-01T00:00:00Z");
        assert!(needs_revalidation_at(
            Some(at("2026-04-01T00:00:00Z")),
            RevalidateFrequency::SevenDays,
            now
        ));
    }

    #[test]
    fn test_durations() {
        assert_eq!(RevalidateFrequency::OneHour.duration(), Duration::hours(1));
        assert_eq!(RevalidateFrequency::SevenDays.duration(), Duration::days(7));
    }
}
