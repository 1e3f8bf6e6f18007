//! Localized tracker date parsing.
//!
//! Tracker pages print timestamps with Russian three-letter month
//! abbreviations in one of two shapes:
//!
//! - short, hyphenated, minute precision: `15-Янв-24 12:30`
//! - full, space separated, second precision: `15 Янв 2024 12:30:45`
//!
//! [`parse_localized_date`] swaps the month for its English abbreviation and
//! parses the result with the layout picked by the presence of a hyphen.
//! No timezone conversion happens; values stay naive, exactly as scraped.

use chrono::{Datelike, NaiveDateTime};
use thiserror::Error;

/// Localized month abbreviation to language-neutral abbreviation.
const MONTHS: [(&str, &str); 12] = [
    ("Янв", "Jan"),
    ("Фев", "Feb"),
    ("Мар", "Mar"),
    ("Апр", "Apr"),
    ("Май", "May"),
    ("Июн", "Jun"),
    ("Июл", "Jul"),
    ("Авг", "Aug"),
    ("Сен", "Sep"),
    ("Окт", "Oct"),
    ("Ноя", "Nov"),
    ("Дек", "Dec"),
];

const SHORT_LAYOUT: &str = "%d %b %y %H:%M";
const FULL_LAYOUT: &str = "%d %b %Y %H:%M:%S";

/// Minimum token count: day, month, year, time.
const MIN_TOKENS: usize = 4;

/// Errors produced by the date normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The input does not match either supported layout.
    #[error("invalid date format '{input}': {reason}")]
    InvalidFormat {
        /// Raw text as scraped.
        input: String,
        /// What went wrong.
        reason: String,
    },
}

impl DateError {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// The two textual shapes trackers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `DD-Mon-YY HH:MM`
    Short,
    /// `DD Mon YYYY HH:MM:SS`
    Full,
}

/// Parses a localized tracker timestamp.
///
/// # Errors
///
/// Returns [`DateError::InvalidFormat`] when fewer than four tokens are
/// present, the month token is not in the lookup table, or the normalized
/// text does not match the selected layout.
pub fn parse_localized_date(raw: &str) -> Result<NaiveDateTime, DateError> {
    let layout = if raw.contains('-') {
        SHORT_LAYOUT
    } else {
        FULL_LAYOUT
    };

    let mut parts: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() < MIN_TOKENS {
        return Err(DateError::invalid(raw, "expected at least 4 tokens"));
    }

    let Some(month) = neutral_month(parts[1]) else {
        return Err(DateError::invalid(
            raw,
            format!("unknown month '{}'", parts[1]),
        ));
    };
    parts[1] = month;

    let normalized = parts.join(" ");
    NaiveDateTime::parse_from_str(&normalized, layout)
        .map_err(|e| DateError::invalid(raw, format!("could not parse '{normalized}': {e}")))
}

/// Formats a timestamp the way trackers print it.
///
/// [`DateLayout::Short`] drops seconds, so only minute-aligned values survive
/// a format/parse round trip in that layout.
#[must_use]
pub fn format_localized_date(value: &NaiveDateTime, layout: DateLayout) -> String {
    let month = MONTHS[value.month0() as usize].0;
    match layout {
        DateLayout::Short => format!(
            "{:02}-{month}-{:02} {}",
            value.day(),
            value.year().rem_euclid(100),
            value.format("%H:%M")
        ),
        DateLayout::Full => format!(
            "{:02} {month} {} {}",
            value.day(),
            value.year(),
            value.format("%H:%M:%S")
        ),
    }
}

fn neutral_month(token: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|(localized, _)| *localized == token)
        .map(|(_, neutral)| *neutral)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_full_layout() {
        let parsed = parse_localized_date("28 Дек 2023 15:41:22").unwrap();
        assert_eq!(parsed, at(2023, 12, 28, 15, 41, 22));
    }

    #[test]
    fn test_parse_short_layout() {
        let parsed = parse_localized_date("05-Мар-24 09:07").unwrap();
        assert_eq!(parsed, at(2024, 3, 5, 9, 7, 0));
    }

    #[test]
    fn test_parse_unknown_month_is_invalid_format() {
        let err = parse_localized_date("31 Xyz 2024 10:00:00").unwrap_err();
        assert!(matches!(err, DateError::InvalidFormat { .. }));
        assert!(err.to_string().contains("unknown month"));
    }

    #[test]
    fn test_parse_too_few_tokens_is_invalid_format() {
        let err = parse_localized_date("31 Янв 2024").unwrap_err();
        assert!(err.to_string().contains("at least 4 tokens"));
    }

    #[test]
    fn test_parse_empty_is_invalid_format() {
        assert!(parse_localized_date("").is_err());
    }

    #[test]
    fn test_parse_rejects_layout_mismatch() {
        // hyphen selects the short layout, which has no seconds
        assert!(parse_localized_date("05-Мар-24 09:07:55").is_err());
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let parsed = parse_localized_date("  1  Июл 2022  00:00:01 ").unwrap();
        assert_eq!(parsed, at(2022, 7, 1, 0, 0, 1));
    }

    #[test]
    fn test_full_layout_round_trip_every_month() {
        for month in 1..=12 {
            let value = at(2025, month, 9, 23, 59, 58);
            let text = format_localized_date(&value, DateLayout::Full);
            assert_eq!(parse_localized_date(&text).unwrap(), value, "{text}");
        }
    }

    #[test]
    fn test_short_layout_round_trip_minute_aligned() {
        for month in 1..=12 {
            let value = at(2024, month, 28, 7, 3, 0);
            let text = format_localized_date(&value, DateLayout::Short);
            assert!(text.contains('-'));
            assert_eq!(parse_localized_date(&text).unwrap(), value, "{text}");
        }
    }

    #[test]
    fn test_format_short_matches_tracker_shape() {
        let text = format_localized_date(&at(2024, 1, 5, 12, 30, 0), DateLayout::Short);
        assert_eq!(text, "05-Янв-24 12:30");
    }
}
