//! Shared utility functions: timestamps, durations and text keys.

use crate::error::{Result, StatsError};
use crate::types::MS_PER_MINUTE;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use unicode_normalization::UnicodeNormalization;

/// Naive layouts seen in listening-history exports, most common first.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Resolves an IANA time zone name such as `Europe/Paris` or `UTC`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim().parse::<Tz>().map_err(|_| {
        StatsError::validation_field(format!("Unknown time zone '{name}'"), "timezone")
    })
}

/// Parses a play timestamp into local wall-clock time in `tz`.
///
/// Offset-bearing values (`2024-01-05T10:00:00Z`, `...+01:00`) are converted
/// into `tz`. Naive values (`2024-01-05 10:00`, `2024-01-05T10:00:00`) are
/// already local and returned as-is; a bare date maps to midnight. Returns
/// `None` for empty or unrecognised input.
pub fn parse_play_timestamp(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz).naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&tz).naive_local());
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Converts milliseconds to whole minutes, rounding half up.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_minutes(ms: u64) -> u64 {
    (ms as f64 / MS_PER_MINUTE as f64).round() as u64
}

/// Case-insensitive substring test used by search filters.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Canonical form of a name used as a lookup key: trimmed, NFKC-normalized
/// and lowercased, so `" Daft Punk"` and `"daft punk"` share one entry.
pub fn normalize_lookup_key(input: &str) -> String {
    input.trim().nfkc().collect::<String>().to_lowercase()
}
