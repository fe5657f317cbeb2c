use chrono::{DateTime, Utc};

/// Cookie holding the client's dedupe signal: the RFC-3339 timestamp of the
/// last visit we accepted from that client.
pub const VISIT_SESSION_COOKIE: &str = "_unique_visit_session";

/// Non-httpOnly diagnostic cookie echoing the last written record. Never
/// read back by the server.
pub const LAST_VISIT_COOKIE: &str = "_last_visit";

pub fn parse_signal(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A signal suppresses a new write only if it survived the last cleanup and
/// was issued on the same UTC calendar day as `now`.
pub fn is_valid(
    signal: DateTime<Utc>,
    cleanup_epoch: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if let Some(epoch) = cleanup_epoch {
        if signal < epoch {
            return false;
        }
    }

    signal.date_naive() == now.date_naive()
}

/// Decide whether an incoming page view should be skipped given the raw
/// cookie value (if any) and the current cleanup epoch. An absent or
/// unparseable cookie never suppresses a write.
pub fn should_skip(
    cookie_value: Option<&str>,
    cleanup_epoch: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    cookie_value
        .and_then(parse_signal)
        .map(|signal| is_valid(signal, cleanup_epoch, now))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn same_day_signal_suppresses_write() {
        let now = ts("2024-06-15T18:00:00Z");
        let signal = ts("2024-06-15T09:30:00Z");
        assert!(is_valid(signal, None, now));
    }

    #[test]
    fn signal_from_previous_day_does_not_suppress() {
        let now = ts("2024-06-16T00:00:01Z");
        let signal = ts("2024-06-15T23:59:59Z");
        assert!(!is_valid(signal, None, now));
    }

    #[test]
    fn cleanup_epoch_invalidates_older_same_day_signal() {
        let now = ts("2024-06-15T18:00:00Z");
        let signal = ts("2024-06-15T09:30:00Z");
        let epoch = ts("2024-06-15T12:00:00Z");
        assert!(!is_valid(signal, Some(epoch), now));
    }

    #[test]
    fn signal_issued_after_epoch_is_honored() {
        let now = ts("2024-06-15T18:00:00Z");
        let signal = ts("2024-06-15T14:00:00Z");
        let epoch = ts("2024-06-15T12:00:00Z");
        assert!(is_valid(signal, Some(epoch), now));
    }

    #[test]
    fn signal_equal_to_epoch_is_honored() {
        // Only signals strictly older than the epoch are invalidated
        let now = ts("2024-06-15T18:00:00Z");
        let epoch = ts("2024-06-15T12:00:00Z");
        assert!(is_valid(epoch, Some(epoch), now));
    }

    #[test]
    fn missing_or_garbage_cookie_never_skips() {
        let now = ts("2024-06-15T18:00:00Z");
        assert!(!should_skip(None, None, now));
        assert!(!should_skip(Some("not-a-timestamp"), None, now));
        assert!(!should_skip(Some(""), None, now));
    }

    #[test]
    fn repeated_views_same_day_skip_after_first() {
        // Simulates N page views in one day: the first is recorded and the
        // cookie it issues suppresses the rest.
        let first_view = ts("2024-06-15T08:00:00Z");
        assert!(!should_skip(None, None, first_view));

        let issued = first_view.to_rfc3339();
        for hour in 9..24 {
            let later = Utc
                .with_ymd_and_hms(2024, 6, 15, hour, 0, 0)
                .unwrap();
            assert!(should_skip(Some(&issued), None, later));
        }
    }

    #[test]
    fn cleanup_after_issue_forces_relog() {
        let issued_at = ts("2024-06-15T08:00:00Z");
        let cookie = issued_at.to_rfc3339();
        let wiped_at = ts("2024-06-15T10:00:00Z");
        let next_view = ts("2024-06-15T11:00:00Z");

        assert!(should_skip(Some(&cookie), None, next_view));
        assert!(!should_skip(Some(&cookie), Some(wiped_at), next_view));
    }
}
