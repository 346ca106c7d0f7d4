//! Listening-history export parsing.
//!
//! Two container formats are understood: a JSON array of record objects and
//! a CSV file with a header row. Either may use the "simple" export key names
//! (`endTime`, `artistName`, `trackName`, `msPlayed`) or the "detailed" ones
//! (`ts`, `master_metadata_album_artist_name`, `master_metadata_track_name`,
//! `ms_played`). Each logical field is resolved independently: the simple
//! name first, then the detailed name when the simple value is missing,
//! empty or zero.

use crate::error::ImportError;
use serde_json::Value;
use std::collections::HashMap;
use streamstats_common::PlayEvent;
use tracing::{debug, instrument, trace};

/// Key pairs for each logical field: (simple, detailed).
const END_TIME_KEYS: (&str, &str) = ("endTime", "ts");
const ARTIST_KEYS: (&str, &str) = ("artistName", "master_metadata_album_artist_name");
const TRACK_KEYS: (&str, &str) = ("trackName", "master_metadata_track_name");
const MS_PLAYED_KEYS: (&str, &str) = ("msPlayed", "ms_played");

/// Container format of an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON array of objects
    Json,
    /// Header row plus comma separated rows
    Csv,
}

impl SourceFormat {
    /// Format implied by the file name, if its extension names one.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".json") {
            Some(Self::Json)
        } else if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

/// Parses raw file bytes. Content that is not UTF-8 is unreadable.
pub fn parse_bytes(file_name: &str, bytes: &[u8]) -> Result<Vec<PlayEvent>, ImportError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ImportError::Unreadable {
        file: file_name.to_string(),
        reason: format!("not valid UTF-8 text: {e}"),
    })?;
    parse_file(file_name, text)
}

/// Parses the full text of one export file.
///
/// `.json` files are parsed as JSON and `.csv` files as CSV. Any other name
/// is tried as JSON first and as CSV when JSON yields nothing. Records
/// without an artist, a track or a positive duration are dropped; if none
/// remain the file is reported as [`ImportError::NoValidRecords`].
#[instrument(skip(text), fields(bytes = text.len()))]
pub fn parse_file(file_name: &str, text: &str) -> Result<Vec<PlayEvent>, ImportError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let events = match SourceFormat::from_file_name(file_name) {
        Some(SourceFormat::Json) => parse_json(text),
        Some(SourceFormat::Csv) => parse_csv(text),
        None => {
            let events = parse_json(text);
            if events.is_empty() {
                trace!("JSON yielded no records, trying CSV");
                parse_csv(text)
            } else {
                events
            }
        }
    };

    if events.is_empty() {
        return Err(ImportError::NoValidRecords {
            file: file_name.to_string(),
        });
    }

    debug!(records = events.len(), "Parsed export file");
    Ok(events)
}

/// Parses a JSON export. Anything but a top-level array yields no records;
/// array elements that are not objects are skipped.
pub fn parse_json(text: &str) -> Vec<PlayEvent> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|record| {
            PlayEvent::new(
                json_text(record, END_TIME_KEYS),
                json_text(record, ARTIST_KEYS),
                json_text(record, TRACK_KEYS),
                json_ms(record, MS_PLAYED_KEYS),
            )
        })
        .filter(PlayEvent::is_retainable)
        .collect()
}

/// Parses a CSV export: one header row, then one record per line.
pub fn parse_csv(text: &str) -> Vec<PlayEvent> {
    let mut lines = text
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers = split_csv_line(header_line);

    lines
        .map(|line| {
            let row: HashMap<&str, String> = headers
                .iter()
                .map(String::as_str)
                .zip(split_csv_line(line))
                .collect();

            PlayEvent::new(
                csv_text(&row, END_TIME_KEYS),
                csv_text(&row, ARTIST_KEYS),
                csv_text(&row, TRACK_KEYS),
                csv_ms(&row, MS_PLAYED_KEYS),
            )
        })
        .filter(PlayEvent::is_retainable)
        .collect()
}

/// Splits one CSV line into trimmed fields.
///
/// Double quotes group text so that commas inside them do not split; the
/// quote characters themselves are dropped. Empty fields are kept so later
/// columns stay aligned with the header.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

fn json_text(record: &serde_json::Map<String, Value>, (simple, detailed): (&str, &str)) -> String {
    json_value_text(record.get(simple))
        .or_else(|| json_value_text(record.get(detailed)))
        .unwrap_or_default()
}

/// Non-empty text of a JSON scalar; null, false, zero and "" count as missing.
fn json_value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn json_ms(record: &serde_json::Map<String, Value>, (simple, detailed): (&str, &str)) -> u64 {
    json_value_ms(record.get(simple))
        .or_else(|| json_value_ms(record.get(detailed)))
        .unwrap_or(0)
}

/// Positive millisecond count of a JSON number or numeric string.
fn json_value_ms(value: Option<&Value>) -> Option<u64> {
    let ms = match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(float_ms)),
        Value::String(s) => parse_ms(s),
        _ => None,
    }?;
    (ms > 0).then_some(ms)
}

fn csv_text(row: &HashMap<&str, String>, (simple, detailed): (&str, &str)) -> String {
    [simple, detailed]
        .iter()
        .filter_map(|key| row.get(key))
        .find(|value| !value.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn csv_ms(row: &HashMap<&str, String>, (simple, detailed): (&str, &str)) -> u64 {
    [simple, detailed]
        .iter()
        .filter_map(|key| row.get(key))
        .find_map(|value| parse_ms(value).filter(|ms| *ms > 0))
        .unwrap_or(0)
}

/// Parses the leading integer of a duration string, so `"1500"` and
/// `"1500.7"` both give 1500.
fn parse_ms(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits_end = raw
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(raw.len(), |(i, _)| i);
    raw[..digits_end].parse().ok()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_ms(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}
