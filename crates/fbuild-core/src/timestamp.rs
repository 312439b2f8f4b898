//! Timestamps embedded in artifact names.
//!
//! Artifacts are stamped as `(YYYYMMDD-HHMMSS)` in local time. The formatter
//! itself is pure; the current instant comes from a [`Clock`].

use chrono::{DateTime, Local, TimeZone};

/// Length of a formatted stamp, parentheses included.
pub const STAMP_LEN: usize = 17;

/// Format an instant as `(YYYYMMDD-HHMMSS)`.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("(%Y%m%d-%H%M%S)").to_string()
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// The current instant, formatted for a file name.
    fn stamp(&self) -> String {
        format_timestamp(&self.now())
    }
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Freeze at a local wall-clock time. Returns `None` for times that do
    /// not exist in the local timezone (e.g. skipped by a DST change).
    pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Local
            .with_ymd_and_hms(year, month, day, hour, min, sec)
            .earliest()
            .map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use proptest::prelude::*;
    use regex::Regex;

    fn stamp_pattern() -> Regex {
        Regex::new(r"^\(\d{8}-\d{6}\)$").unwrap()
    }

    #[test]
    fn test_format_known_instant() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&at), "(20240102-030405)");
    }

    #[test]
    fn test_fields_are_zero_padded() {
        let at = Utc.with_ymd_and_hms(2009, 9, 9, 9, 9, 9).unwrap();
        let stamp = format_timestamp(&at);
        assert_eq!(stamp, "(20090909-090909)");
        assert_eq!(stamp.len(), STAMP_LEN);
    }

    #[test]
    fn test_fixed_clock_stamp() {
        let clock = FixedClock::at(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(clock.stamp(), "(20240102-030405)");
    }

    #[test]
    fn test_same_second_is_stable() {
        let clock = FixedClock::at(2024, 6, 30, 23, 59, 59).unwrap();
        assert_eq!(clock.stamp(), clock.stamp());
    }

    #[test]
    fn test_one_second_apart_differs() {
        let first = FixedClock::at(2024, 6, 30, 12, 0, 0).unwrap();
        let second = FixedClock(first.0 + Duration::seconds(1));
        assert_ne!(first.stamp(), second.stamp());
    }

    #[test]
    fn test_system_clock_shape() {
        let stamp = SystemClock.stamp();
        assert!(stamp_pattern().is_match(&stamp), "bad stamp: {}", stamp);
    }

    proptest! {
        #[test]
        fn prop_stamp_shape(secs in 0i64..(9000 * 365 * 86_400)) {
            let base = NaiveDate::from_ymd_opt(1000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            let at = base + Duration::seconds(secs);
            let stamp = format_timestamp(&at);
            prop_assert_eq!(stamp.len(), STAMP_LEN);
            prop_assert!(stamp_pattern().is_match(&stamp));
            prop_assert_eq!(stamp.clone(), format_timestamp(&at));
        }

        #[test]
        fn prop_adjacent_seconds_differ(secs in 0i64..(9000 * 365 * 86_400)) {
            let base = NaiveDate::from_ymd_opt(1000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc();
            let at = base + Duration::seconds(secs);
            prop_assert_ne!(
                format_timestamp(&at),
                format_timestamp(&(at + Duration::seconds(1)))
            );
        }
    }
}
