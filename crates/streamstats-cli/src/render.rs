//! Text and JSON rendering of import results.

use serde::Serialize;
use std::io::Write;
use streamstats_engine::{AggregatedSummary, BatchEntry, FileStatus, FilteredView, PlayFilter};
use streamstats_i18n::Localizer;

/// Bar width of the hour and weekday histograms.
const BAR_WIDTH: u64 = 30;

/// Status label of a batch entry.
pub fn status_label(status: &FileStatus, localizer: &Localizer) -> String {
    match status {
        FileStatus::Success { record_count } => localizer.status_success(*record_count),
        FileStatus::Error(err) => localizer.status_error(&localizer.format(err.message_id(), None)),
        other => localizer.format(other.message_id(), None),
    }
}

/// One `name: status` line per file.
pub fn write_statuses<W: Write>(
    out: &mut W,
    entries: &[BatchEntry],
    localizer: &Localizer,
) -> std::io::Result<()> {
    for entry in entries {
        writeln!(out, "{}: {}", entry.name(), status_label(entry.status(), localizer))?;
    }
    Ok(())
}

fn bar(value: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    "#".repeat(usize::try_from(value * BAR_WIDTH / max).unwrap_or(0))
}

/// Human-readable summary.
pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &AggregatedSummary,
    localizer: &Localizer,
) -> std::io::Result<()> {
    let label = |id: &str| localizer.format(id, None);

    writeln!(out, "{}", label("summary-title"))?;
    writeln!(out, "  {}: {}", label("summary-total-streams"), summary.total_streams)?;
    writeln!(out, "  {}: {}", label("summary-total-minutes"), summary.total_minutes)?;
    writeln!(out, "  {}: {}", label("summary-listening-hours"), summary.listening_hours())?;
    writeln!(out, "  {}: {}", label("summary-unique-tracks"), summary.unique_tracks)?;
    writeln!(out, "  {}: {}", label("summary-unique-artists"), summary.unique_artists)?;

    writeln!(out, "\n{}", label("summary-top-tracks"))?;
    for (rank, track) in summary.top_tracks.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {} - {} ({}, {})",
            rank + 1,
            track.name,
            track.artist,
            localizer.plays(track.plays),
            localizer.minutes(track.minutes)
        )?;
    }

    writeln!(out, "\n{}", label("summary-top-artists"))?;
    for (rank, artist) in summary.top_artists.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {} ({}, {})",
            rank + 1,
            artist.name,
            localizer.plays(artist.plays),
            localizer.minutes(artist.minutes)
        )?;
    }

    writeln!(out, "\n{}", label("summary-monthly"))?;
    for month in &summary.monthly_data {
        writeln!(
            out,
            "  {}  {:>6}  {}",
            month.month,
            localizer.plays(month.streams),
            localizer.minutes(month.minutes)
        )?;
    }

    writeln!(out, "\n{}", label("summary-daily"))?;
    for day in &summary.daily_data {
        writeln!(
            out,
            "  {}  {:>6}  {}",
            day.date,
            localizer.plays(day.streams),
            localizer.minutes(day.minutes)
        )?;
    }

    let busiest_hour = summary.hourly_data.iter().map(|h| h.streams).max().unwrap_or(0);
    writeln!(out, "\n{}", label("summary-hourly"))?;
    for hour in &summary.hourly_data {
        writeln!(out, "  {:>4} {:>5} {}", hour.hour, hour.streams, bar(hour.streams, busiest_hour))?;
    }

    let busiest_day = summary.weekday_data.iter().map(|d| d.streams).max().unwrap_or(0);
    writeln!(out, "\n{}", label("summary-weekday"))?;
    for day in &summary.weekday_data {
        writeln!(out, "  {:>4} {:>5} {}", day.day, day.streams, bar(day.streams, busiest_day))?;
    }

    Ok(())
}

/// Per-file entry of the JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// File name
    pub name: String,
    /// `pending`, `processing`, `success` or `error`
    pub status: &'static str,
    /// Retained records of a successful file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&BatchEntry> for FileReport {
    fn from(entry: &BatchEntry) -> Self {
        let (status, record_count, error) = match entry.status() {
            FileStatus::Pending => ("pending", None, None),
            FileStatus::Processing => ("processing", None, None),
            FileStatus::Success { record_count } => ("success", Some(*record_count), None),
            FileStatus::Error(err) => ("error", None, Some(err.to_string())),
        };
        Self {
            name: entry.name().to_string(),
            status,
            record_count,
            error,
        }
    }
}

/// Filter section of the JSON output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterReport<'a> {
    /// Applied filter
    pub filter: &'a PlayFilter,
    /// Matching plays
    pub matching: usize,
    /// Plays the filter was applied to
    pub total: usize,
}

/// The whole JSON document printed by `import --format json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    /// Per-file outcome
    pub files: Vec<FileReport>,
    /// Summary of the full or filtered dataset
    pub summary: &'a AggregatedSummary,
    /// Present when a filter was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterReport<'a>>,
}

impl<'a> JsonReport<'a> {
    /// Report over a batch and the view printed for it.
    pub fn new(entries: &[BatchEntry], view: &'a FilteredView, filter: &'a PlayFilter) -> Self {
        Self {
            files: entries.iter().map(FileReport::from).collect(),
            summary: &view.summary,
            filter: filter.is_active().then(|| FilterReport {
                filter,
                matching: view.matching(),
                total: view.total_available,
            }),
        }
    }
}
