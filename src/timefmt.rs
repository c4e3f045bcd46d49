//! Timestamp formatting and human-relative durations.
//!
//! Board timestamps are stored with minute precision in the display format
//! `"Mar 5, 2024 09:30"`, so the value held in memory is always the value
//! that comes back from disk.

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Display and storage format for board timestamps.
pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %H:%M";
const TIMESTAMP_PARSE_FORMAT: &str = "%b %d, %Y %H:%M";

/// A wall-clock timestamp with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wrap a date-time, dropping seconds and sub-seconds.
    pub fn new(dt: NaiveDateTime) -> Self {
        let truncated = dt
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        Timestamp(truncated)
    }

    /// Current local time.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Parse either the display format or an ISO-8601 date-time.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, TIMESTAMP_PARSE_FORMAT)
            .ok()
            .or_else(|| s.parse::<NaiveDateTime>().ok())
            .map(Self::new)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self::new(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}

/// Describe the distance between two instants the way a person would
/// ("a few seconds", "3 minutes", "an hour", "2 years"), without a
/// "ago"/"in" suffix. Direction is ignored.
pub fn relative_duration(from: NaiveDateTime, to: NaiveDateTime) -> String {
    let secs = (to - from).num_seconds().unsigned_abs() as f64;

    if secs <= 44.0 {
        return "a few seconds".into();
    }
    if secs <= 89.0 {
        return "a minute".into();
    }
    let minutes = (secs / 60.0).round();
    if minutes <= 44.0 {
        return format!("{minutes} minutes");
    }
    if minutes <= 89.0 {
        return "an hour".into();
    }
    let hours = (secs / 3600.0).round();
    if hours <= 21.0 {
        return format!("{hours} hours");
    }
    if hours <= 35.0 {
        return "a day".into();
    }
    let days = (secs / 86_400.0).round();
    if days <= 25.0 {
        return format!("{days} days");
    }
    if days <= 45.0 {
        return "a month".into();
    }
    // Average Gregorian month length.
    let months = (days / 30.436875).round();
    if months <= 10.0 {
        return format!("{months} months");
    }
    if months <= 17.0 {
        return "a year".into();
    }
    let years = (days / 365.25).round().max(2.0);
    format!("{years} years")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_display_matches_board_format() {
        assert_eq!(Timestamp::new(base()).to_string(), "Mar 5, 2024 09:30");
        let late = NaiveDate::from_ymd_opt(2023, 12, 25)
            .unwrap()
            .and_hms_opt(18, 5, 59)
            .unwrap();
        assert_eq!(Timestamp::new(late).to_string(), "Dec 25, 2023 18:05");
    }

    #[test]
    fn test_parse_accepts_display_and_iso() {
        assert_eq!(Timestamp::parse("Mar 5, 2024 09:30"), Some(Timestamp::new(base())));
        assert_eq!(Timestamp::parse("2024-03-05T09:30:00"), Some(Timestamp::new(base())));
        assert_eq!(Timestamp::parse("yesterday-ish"), None);
    }

    #[test]
    fn test_seconds_are_dropped() {
        let with_seconds = base() + Duration::seconds(42);
        assert_eq!(Timestamp::new(with_seconds), Timestamp::new(base()));
    }

    #[test]
    fn test_relative_duration_thresholds() {
        let cases = [
            (Duration::seconds(30), "a few seconds"),
            (Duration::seconds(60), "a minute"),
            (Duration::minutes(3), "3 minutes"),
            (Duration::minutes(50), "an hour"),
            (Duration::hours(5), "5 hours"),
            (Duration::hours(30), "a day"),
            (Duration::days(3), "3 days"),
            (Duration::days(40), "a month"),
            (Duration::days(100), "3 months"),
            (Duration::days(400), "a year"),
            (Duration::days(800), "2 years"),
        ];
        for (offset, expected) in cases {
            assert_eq!(relative_duration(base(), base() + offset), expected, "{offset:?}");
        }
    }

    #[test]
    fn test_relative_duration_ignores_direction() {
        assert_eq!(
            relative_duration(base() + Duration::minutes(3), base()),
            "3 minutes"
        );
    }
}
