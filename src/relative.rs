use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{OdexError, Result};

/// Relative points in time offered by the date filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDate {
    Now,
    Yesterday,
    AWeekAgo,
    AMonthAgo,
    Tomorrow,
    NextWeek,
    NextMonth,
}

pub const RELATIVE_DATE_LABELS: &[&str] = &[
    "now",
    "yesterday",
    "a week ago",
    "a month ago",
    "tomorrow",
    "next week",
    "next month",
];

impl RelativeDate {
    pub const ALL: [RelativeDate; 7] = [
        Self::Now,
        Self::Yesterday,
        Self::AWeekAgo,
        Self::AMonthAgo,
        Self::Tomorrow,
        Self::NextWeek,
        Self::NextMonth,
    ];

    pub fn label(self) -> &'static str {
        RELATIVE_DATE_LABELS[self as usize]
    }

    /// Accepts the preset's index (`"3"`) or its label (`"a month ago"`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(index) = raw.parse::<usize>() {
            return Self::ALL.get(index).copied();
        }
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.label().eq_ignore_ascii_case(raw))
    }

    pub fn resolve(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let shifted = match self {
            Self::Now => Some(now),
            Self::Yesterday => now.checked_sub_days(Days::new(1)),
            Self::AWeekAgo => now.checked_sub_days(Days::new(7)),
            Self::AMonthAgo => now.checked_sub_months(Months::new(1)),
            Self::Tomorrow => now.checked_add_days(Days::new(1)),
            Self::NextWeek => now.checked_add_days(Days::new(7)),
            Self::NextMonth => now.checked_add_months(Months::new(1)),
        };
        shifted.unwrap_or(now)
    }
}

/// `2024-01-02T03:04:05.000Z`
pub fn format_iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A datetime filter value: a relative preset, an RFC 3339 timestamp, a naive
/// `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare date.
pub fn resolve_datetime_input(raw: &str, now: DateTime<Utc>) -> Result<String> {
    if let Some(preset) = RelativeDate::parse(raw) {
        return Ok(format_iso(preset.resolve(now)));
    }
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(format_iso(parsed.with_timezone(&Utc)));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Ok(format_iso(parsed.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(format_iso(midnight.and_utc()));
    }
    Err(OdexError::InvalidFilterValue {
        expected: format!("a date or one of: {}", RELATIVE_DATE_LABELS.join(", ")),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 30, 0).unwrap()
    }

    #[test]
    fn parses_index_and_label() {
        assert_eq!(RelativeDate::parse("0"), Some(RelativeDate::Now));
        assert_eq!(RelativeDate::parse("A Week Ago"), Some(RelativeDate::AWeekAgo));
        assert_eq!(RelativeDate::parse("7"), None);
        assert_eq!(RelativeDate::parse("later"), None);
    }

    #[test]
    fn resolves_against_supplied_clock() {
        let now = clock();
        assert_eq!(format_iso(RelativeDate::Now.resolve(now)), "2024-03-31T12:30:00.000Z");
        assert_eq!(
            format_iso(RelativeDate::Yesterday.resolve(now)),
            "2024-03-30T12:30:00.000Z"
        );
        assert_eq!(
            format_iso(RelativeDate::NextWeek.resolve(now)),
            "2024-04-07T12:30:00.000Z"
        );
        // month arithmetic clamps to the end of the shorter month
        assert_eq!(
            format_iso(RelativeDate::AMonthAgo.resolve(now)),
            "2024-02-29T12:30:00.000Z"
        );
    }

    #[test]
    fn accepts_literal_dates() {
        let now = clock();
        assert_eq!(
            resolve_datetime_input("2023-05-01", now).unwrap(),
            "2023-05-01T00:00:00.000Z"
        );
        assert_eq!(
            resolve_datetime_input("2023-05-01T10:00:00+02:00", now).unwrap(),
            "2023-05-01T08:00:00.000Z"
        );
        assert_eq!(
            resolve_datetime_input("2023-05-01T10:15:30", now).unwrap(),
            "2023-05-01T10:15:30.000Z"
        );
        assert!(matches!(
            resolve_datetime_input("soonish", now),
            Err(OdexError::InvalidFilterValue { .. })
        ));
    }
}
