//! Typed field parsing and plausibility checks

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Longest plausible runtime, in minutes
pub const MAX_DURATION_MINUTES: u32 = 1440;

/// Shortest description kept
pub const MIN_DESCRIPTION_CHARS: usize = 8;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*(?:[-/.]\s*(\d{1,2})\s*[-/.]\s*(\d{1,2})|年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日)")
        .unwrap()
});
static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:\d+D)?T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").unwrap()
});
static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})").unwrap());
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,4})\s*(?:分|min\b|mins\b|minutes?\b)").unwrap()
});
static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,4}$").unwrap());

/// Parses the first date found in the text
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD` and `YYYY年M月D日`, with or
/// without zero padding.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text)?;
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let (month, day) = match (caps.get(2), caps.get(3)) {
        (Some(m), Some(d)) => (m, d),
        _ => (caps.get(4)?, caps.get(5)?),
    };
    NaiveDate::from_ymd_opt(year, month.as_str().parse().ok()?, day.as_str().parse().ok()?)
}

/// Parses a runtime into whole minutes
///
/// Accepts `NN分`, `NN min`, `HH:MM:SS`, ISO-8601 `PT…` durations and a bare
/// number of minutes.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let text = text.trim();

    if let Some(caps) = ISO_DURATION_RE.captures(text) {
        let hours: u32 = caps.get(1).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let minutes: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let seconds: f64 = caps.get(3).map_or(Ok(0.0), |m| m.as_str().parse()).ok()?;
        return Some(hours * 60 + minutes + (seconds / 60.0).round() as u32);
    }

    if let Some(caps) = CLOCK_RE.captures(text) {
        let hours: u32 = caps[1].parse().ok()?;
        let minutes: u32 = caps[2].parse().ok()?;
        let seconds: u32 = caps[3].parse().ok()?;
        return Some(hours * 60 + minutes + u32::from(seconds >= 30));
    }

    if let Some(caps) = MINUTES_RE.captures(text) {
        return caps[1].parse().ok();
    }

    if BARE_NUMBER_RE.is_match(text) {
        return text.parse().ok();
    }

    None
}

/// Returns true if a release date is plausible relative to `today`
pub fn plausible_date(date: NaiveDate, today: NaiveDate) -> bool {
    let latest = today.checked_add_months(Months::new(12)).unwrap_or(today);
    date.year() >= 1970 && date <= latest
}

/// Returns true if a runtime is plausible
pub fn plausible_duration(minutes: u32) -> bool {
    (1..=MAX_DURATION_MINUTES).contains(&minutes)
}

/// Returns true if a description is long enough to keep
pub fn plausible_description(text: &str) -> bool {
    text.chars().count() >= MIN_DESCRIPTION_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-01"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("配信日: 2024/3/1"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("2024.03.01 発売"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("2024年3月1日"), Some(ymd(2024, 3, 1)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("coming soon"), None);
    }

    #[test]
    fn test_parse_duration_formats() {
        assert_eq!(parse_duration_minutes("120分"), Some(120));
        assert_eq!(parse_duration_minutes("収録時間: 95 分"), Some(95));
        assert_eq!(parse_duration_minutes("118 min"), Some(118));
        assert_eq!(parse_duration_minutes("01:58:40"), Some(119));
        assert_eq!(parse_duration_minutes("PT2H5M"), Some(125));
        assert_eq!(parse_duration_minutes("PT90M"), Some(90));
        assert_eq!(parse_duration_minutes("150"), Some(150));
        assert_eq!(parse_duration_minutes("about two hours"), None);
    }

    #[test]
    fn test_plausibility() {
        let today = ymd(2024, 6, 1);
        assert!(plausible_date(ymd(2024, 3, 1), today));
        assert!(plausible_date(ymd(2025, 5, 31), today));
        assert!(!plausible_date(ymd(2026, 1, 1), today));
        assert!(!plausible_date(ymd(1969, 12, 31), today));

        assert!(plausible_duration(1));
        assert!(plausible_duration(1440));
        assert!(!plausible_duration(0));
        assert!(!plausible_duration(7200));

        assert!(plausible_description("A long enough description"));
        assert!(!plausible_description("short"));
    }
}
