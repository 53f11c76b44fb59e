//! Contact-date normalization.
//!
//! Chat notifications carry dates the way a phone shows them: "Yesterday",
//! a weekday name, or a short "Wed, 12 Jun" stamp with no year. This module
//! resolves those against the current date, always preferring the past.

use chrono::{Datelike, Duration, Local, Month, NaiveDate, Weekday};
use regex::{Captures, Regex};

use crate::error::{LeadIntakeError, Result};

const DATE_KEYWORD_PATTERN: &str = r"(?i)(?:Yesterday|Today|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday|(?P<lead>\w{3}), (?P<day>\d{1,2}) (?P<month>\w{3}))";

/// Storage rendering of a contact date, e.g. "Jun 14, 2024"
pub const SHEET_DATE_FORMAT: &str = "%b %d, %Y";

/// Render a date the way the sheet stores it.
#[must_use]
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

/// Source of "now" for date resolution
pub trait Clock: Send + Sync {
    /// Current calendar date
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the server's local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Resolves date expressions in message text to calendar dates
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    keyword_regex: Regex,
}

impl DateNormalizer {
    /// Create a new normalizer
    pub fn new() -> Result<Self> {
        let keyword_regex = Regex::new(DATE_KEYWORD_PATTERN)
            .map_err(|e| LeadIntakeError::Other(format!("Failed to compile date regex: {e}")))?;

        Ok(Self { keyword_regex })
    }

    /// Resolve the first date expression in `raw_text` against `now`.
    ///
    /// Never fails: text without a recognizable date, or with one that does
    /// not form a valid calendar date, yields `now`.
    #[must_use]
    pub fn normalize(&self, raw_text: &str, now: NaiveDate) -> NaiveDate {
        let Some(caps) = self.keyword_regex.captures(raw_text) else {
            return now;
        };

        let resolved = if caps.name("day").is_some() {
            resolve_short_date(&caps, now)
        } else {
            resolve_relative(&caps[0], now)
        };

        resolved.unwrap_or_else(|| {
            tracing::debug!(matched = &caps[0], "Date expression not interpretable, using today");
            now
        })
    }
}

/// "Today", "Yesterday", or a weekday name, resolved to the most recent past
/// occurrence. A weekday equal to today's resolves to one week ago.
fn resolve_relative(keyword: &str, now: NaiveDate) -> Option<NaiveDate> {
    match keyword.to_ascii_lowercase().as_str() {
        "today" => Some(now),
        "yesterday" => now.checked_sub_signed(Duration::days(1)),
        name => {
            let target = name.parse::<Weekday>().ok()?;
            let back = (7 + now.weekday().num_days_from_monday() - target.num_days_from_monday()) % 7;
            let back = if back == 0 { 7 } else { back };
            now.checked_sub_signed(Duration::days(i64::from(back)))
        },
    }
}

/// "Wed, 12 Jun": day and month from the text, year always taken from `now`.
fn resolve_short_date(caps: &Captures<'_>, now: NaiveDate) -> Option<NaiveDate> {
    let lead = caps.name("lead")?.as_str();
    if lead.parse::<Weekday>().is_err() && lead.parse::<Month>().is_err() {
        return None;
    }

    let day = caps.name("day")?.as_str().parse::<u32>().ok()?;
    let month = caps.name("month")?.as_str().parse::<Month>().ok()?;

    NaiveDate::from_ymd_opt(now.year(), month.number_from_month(), day)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Saturday
    fn now() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn normalize(text: &str) -> String {
        let normalizer = DateNormalizer::new().unwrap();
        format_sheet_date(normalizer.normalize(text, now()))
    }

    #[test]
    fn test_yesterday_and_today() {
        assert_eq!(normalize("Yesterday 10:42 PM +91 98765 43210"), "Jun 14, 2024");
        assert_eq!(normalize("today"), "Jun 15, 2024");
        assert_eq!(normalize("TODAY"), "Jun 15, 2024");
    }

    #[test]
    fn test_weekday_prefers_past() {
        assert_eq!(normalize("Friday"), "Jun 14, 2024");
        assert_eq!(normalize("monday"), "Jun 10, 2024");
        assert_eq!(normalize("Sunday"), "Jun 09, 2024");
    }

    #[test]
    fn test_same_weekday_is_one_week_ago() {
        assert_eq!(normalize("Saturday"), "Jun 08, 2024");
    }

    #[test]
    fn test_short_date_uses_current_year() {
        assert_eq!(normalize("Wed, 12 Jun"), "Jun 12, 2024");
        assert_eq!(normalize("sent thu, 3 jan 2019"), "Jan 03, 2024");
    }

    #[test]
    fn test_short_date_in_the_future_keeps_current_year() {
        assert_eq!(normalize("Tue, 24 Dec"), "Dec 24, 2024");
    }

    #[test]
    fn test_weekday_name_wins_over_short_date() {
        // The full weekday word matches first at the same position.
        assert_eq!(normalize("Monday, 12 Jun"), "Jun 10, 2024");
    }

    #[test]
    fn test_uninterpretable_dates_fall_back_to_now() {
        assert_eq!(normalize("abc, 12 Jun"), "Jun 15, 2024");
        assert_eq!(normalize("Wed, 12 Foo"), "Jun 15, 2024");
        assert_eq!(normalize("Wed, 31 Feb"), "Jun 15, 2024");
    }

    #[test]
    fn test_leap_day_outside_leap_year_falls_back() {
        let normalizer = DateNormalizer::new().unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(normalizer.normalize("Thu, 29 Feb", now), now);
    }

    #[test]
    fn test_no_keyword_is_now() {
        assert_eq!(normalize("+91 98765 43210 wants a callback"), "Jun 15, 2024");
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(now()).today(), now());
    }
}
