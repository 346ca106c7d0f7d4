//! The aggregated statistics model shared by every view.

use serde::{Deserialize, Serialize};

/// Number of hour-of-day slots.
pub const HOURS_PER_DAY: usize = 24;
/// Number of weekday slots.
pub const DAYS_PER_WEEK: usize = 7;

/// Ranked track entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStat {
    /// Track title
    pub name: String,
    /// Credited artist
    pub artist: String,
    /// Number of plays
    pub plays: u64,
    /// Total listening time in whole minutes
    pub minutes: u64,
}

/// Ranked artist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistStat {
    /// Artist name
    pub name: String,
    /// Number of plays
    pub plays: u64,
    /// Total listening time in whole minutes
    pub minutes: u64,
}

/// Listening in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthStat {
    /// `YYYY-MM`
    pub month: String,
    /// Whole minutes
    pub minutes: u64,
    /// Number of plays
    pub streams: u64,
}

/// Listening on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStat {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Whole minutes
    pub minutes: u64,
    /// Number of plays
    pub streams: u64,
}

/// Plays during one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourStat {
    /// Display label, e.g. `7h`
    pub hour: String,
    /// Number of plays
    pub streams: u64,
}

/// Plays on one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayStat {
    /// Localized short day name
    pub day: String,
    /// Number of plays
    pub streams: u64,
}

/// Statistics derived from one collection of play events.
///
/// Every field is computed from the same events: `daily_data` streams sum
/// to `total_streams` when every event has a parseable timestamp, and
/// `hourly_data` and `weekday_data` always hold 24 and 7 slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    /// Number of events
    pub total_streams: u64,
    /// Total listening time, rounded to whole minutes
    pub total_minutes: u64,
    /// Distinct (track, artist) pairs
    pub unique_tracks: usize,
    /// Distinct artists
    pub unique_artists: usize,
    /// Most played tracks
    pub top_tracks: Vec<TrackStat>,
    /// Most played artists
    pub top_artists: Vec<ArtistStat>,
    /// Per month, ascending
    pub monthly_data: Vec<MonthStat>,
    /// Hours 0 to 23
    pub hourly_data: Vec<HourStat>,
    /// Sunday to Saturday
    pub weekday_data: Vec<WeekdayStat>,
    /// Per day, ascending
    pub daily_data: Vec<DayStat>,
}

impl AggregatedSummary {
    /// Whether the summary was computed from no events.
    pub const fn is_empty(&self) -> bool {
        self.total_streams == 0
    }

    /// Total listening time in whole hours.
    pub const fn listening_hours(&self) -> u64 {
        (self.total_minutes + 30) / 60
    }

    /// Sum of the daily stream counts.
    pub fn daily_streams(&self) -> u64 {
        self.daily_data.iter().map(|d| d.streams).sum()
    }
}
