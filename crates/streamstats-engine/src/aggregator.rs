//! Reduction of play events into an [`AggregatedSummary`].
//!
//! The reduction is pure and synchronous. Each facet of the summary has its
//! own accumulator fed by a single pass over the events; the timestamp of
//! every event is parsed once and shared by the calendar and clock facets.

use crate::summary::{
    AggregatedSummary, ArtistStat, DayStat, HourStat, MonthStat, TrackStat, WeekdayStat,
    DAYS_PER_WEEK, HOURS_PER_DAY,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use streamstats_common::{parse_play_timestamp, parse_timezone, round_minutes, PlayEvent, Result};
use streamstats_config::AggregationConfig;
use streamstats_i18n::Localizer;
use tracing::{debug, instrument};

/// Default length of the rankings.
pub const DEFAULT_TOP_LIMIT: usize = 10;

const ENGLISH_WEEKDAYS: [&str; DAYS_PER_WEEK] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Accumulates one facet of the summary.
trait Facet {
    type Output;

    /// Feeds one event; `index` is its position in the input and `local` its
    /// parsed wall-clock time, if any.
    fn observe(&mut self, index: usize, event: &PlayEvent, local: Option<NaiveDateTime>);

    fn finish(self) -> Self::Output;
}

/// Play count and duration of one identity.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    first_seen: usize,
    plays: u64,
    ms: u64,
}

impl Tally {
    fn record(&mut self, ms: u64) {
        self.plays += 1;
        self.ms += ms;
    }
}

/// Frequency and duration per key, ranked by plays with the first-seen
/// position as the tie breaker.
struct RankingFacet<K> {
    key_of: fn(&PlayEvent) -> K,
    tallies: HashMap<K, Tally>,
}

impl<K: Eq + Hash> RankingFacet<K> {
    fn new(key_of: fn(&PlayEvent) -> K) -> Self {
        Self {
            key_of,
            tallies: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Facet for RankingFacet<K> {
    type Output = (usize, Vec<(K, Tally)>);

    fn observe(&mut self, index: usize, event: &PlayEvent, _local: Option<NaiveDateTime>) {
        self.tallies
            .entry((self.key_of)(event))
            .or_insert(Tally {
                first_seen: index,
                ..Tally::default()
            })
            .record(event.ms_played);
    }

    /// Distinct key count and every key ranked.
    fn finish(self) -> Self::Output {
        let distinct = self.tallies.len();
        let mut ranked: Vec<(K, Tally)> = self.tallies.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.plays
                .cmp(&a.plays)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        (distinct, ranked)
    }
}

#[derive(Default)]
struct CalendarFacet {
    months: BTreeMap<(i32, u32), Tally>,
    days: BTreeMap<NaiveDate, Tally>,
}

impl Facet for CalendarFacet {
    type Output = (Vec<MonthStat>, Vec<DayStat>);

    fn observe(&mut self, _index: usize, event: &PlayEvent, local: Option<NaiveDateTime>) {
        let Some(local) = local else { return };
        self.months
            .entry((local.year(), local.month()))
            .or_default()
            .record(event.ms_played);
        self.days
            .entry(local.date())
            .or_default()
            .record(event.ms_played);
    }

    fn finish(self) -> Self::Output {
        let months = self
            .months
            .into_iter()
            .map(|((year, month), tally)| MonthStat {
                month: format!("{year:04}-{month:02}"),
                minutes: round_minutes(tally.ms),
                streams: tally.plays,
            })
            .collect();
        let days = self
            .days
            .into_iter()
            .map(|(date, tally)| DayStat {
                date: date.format("%Y-%m-%d").to_string(),
                minutes: round_minutes(tally.ms),
                streams: tally.plays,
            })
            .collect();
        (months, days)
    }
}

#[derive(Default)]
struct ClockFacet {
    hours: [u64; HOURS_PER_DAY],
    weekdays: [u64; DAYS_PER_WEEK],
}

impl Facet for ClockFacet {
    type Output = ([u64; HOURS_PER_DAY], [u64; DAYS_PER_WEEK]);

    fn observe(&mut self, _index: usize, _event: &PlayEvent, local: Option<NaiveDateTime>) {
        let Some(local) = local else { return };
        self.hours[local.hour() as usize] += 1;
        self.weekdays[local.weekday().num_days_from_sunday() as usize] += 1;
    }

    fn finish(self) -> Self::Output {
        (self.hours, self.weekdays)
    }
}

/// Reduces play events into summaries.
///
/// Rankings hold at most `top_limit` entries. Timestamps carrying an offset
/// are moved into `timezone` before bucketing; naive ones are already local.
#[derive(Debug, Clone)]
pub struct Aggregator {
    top_limit: usize,
    timezone: Tz,
    weekday_labels: [String; DAYS_PER_WEEK],
    hour_labels: Vec<String>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Top 10, UTC, English labels.
    pub fn new() -> Self {
        Self {
            top_limit: DEFAULT_TOP_LIMIT,
            timezone: Tz::UTC,
            weekday_labels: ENGLISH_WEEKDAYS.map(String::from),
            hour_labels: (0..HOURS_PER_DAY).map(|h| format!("{h}h")).collect(),
        }
    }

    /// Builds an aggregator from configuration, with labels from `localizer`.
    pub fn from_config(config: &AggregationConfig, localizer: &Localizer) -> Result<Self> {
        let timezone = parse_timezone(&config.timezone)?;
        Ok(Self::new()
            .with_top_limit(config.top_limit)
            .with_timezone(timezone)
            .localized(localizer))
    }

    /// Sets the ranking length.
    #[must_use]
    pub const fn with_top_limit(mut self, top_limit: usize) -> Self {
        self.top_limit = top_limit;
        self
    }

    /// Sets the display time zone.
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the weekday labels, Sunday first.
    #[must_use]
    pub fn with_weekday_labels(mut self, labels: [String; DAYS_PER_WEEK]) -> Self {
        self.weekday_labels = labels;
        self
    }

    /// Takes weekday and hour labels from a localizer.
    #[must_use]
    pub fn localized(mut self, localizer: &Localizer) -> Self {
        self.weekday_labels = localizer.weekday_labels();
        self.hour_labels = (0..HOURS_PER_DAY as u32)
            .map(|h| localizer.hour_label(h))
            .collect();
        self
    }

    /// Ranking length.
    pub const fn top_limit(&self) -> usize {
        self.top_limit
    }

    /// Display time zone.
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Wall-clock time of an event in the display zone, if its timestamp
    /// parses.
    pub fn local_time(&self, event: &PlayEvent) -> Option<NaiveDateTime> {
        parse_play_timestamp(&event.end_time, self.timezone)
    }

    /// Computes the summary of `events`.
    ///
    /// Deterministic for a given input order; an empty slice gives zero
    /// totals, empty rankings and calendars, and zero-filled hour and
    /// weekday slots.
    #[instrument(skip(self, events), fields(events = events.len()))]
    pub fn aggregate(&self, events: &[PlayEvent]) -> AggregatedSummary {
        let mut tracks = RankingFacet::new(|e: &PlayEvent| {
            let (track, artist) = e.track_identity();
            (track.to_owned(), artist.to_owned())
        });
        let mut artists = RankingFacet::new(|e: &PlayEvent| e.artist_name.clone());
        let mut calendar = CalendarFacet::default();
        let mut clock = ClockFacet::default();
        let mut total_ms: u64 = 0;
        let mut undated = 0usize;

        for (index, event) in events.iter().enumerate() {
            let local = self.local_time(event);
            if local.is_none() {
                undated += 1;
            }
            total_ms += event.ms_played;
            tracks.observe(index, event, local);
            artists.observe(index, event, local);
            calendar.observe(index, event, local);
            clock.observe(index, event, local);
        }

        let (unique_tracks, ranked_tracks) = tracks.finish();
        let (unique_artists, ranked_artists) = artists.finish();
        let (monthly_data, daily_data) = calendar.finish();
        let (hours, weekdays) = clock.finish();

        let summary = AggregatedSummary {
            total_streams: events.len() as u64,
            total_minutes: round_minutes(total_ms),
            unique_tracks,
            unique_artists,
            top_tracks: ranked_tracks
                .into_iter()
                .take(self.top_limit)
                .map(|((name, artist), tally)| TrackStat {
                    name,
                    artist,
                    plays: tally.plays,
                    minutes: round_minutes(tally.ms),
                })
                .collect(),
            top_artists: ranked_artists
                .into_iter()
                .take(self.top_limit)
                .map(|(name, tally)| ArtistStat {
                    name,
                    plays: tally.plays,
                    minutes: round_minutes(tally.ms),
                })
                .collect(),
            monthly_data,
            hourly_data: self
                .hour_labels
                .iter()
                .zip(hours)
                .map(|(label, streams)| HourStat {
                    hour: label.clone(),
                    streams,
                })
                .collect(),
            weekday_data: self
                .weekday_labels
                .iter()
                .zip(weekdays)
                .map(|(label, streams)| WeekdayStat {
                    day: label.clone(),
                    streams,
                })
                .collect(),
            daily_data,
        };

        debug!(
            streams = summary.total_streams,
            minutes = summary.total_minutes,
            undated,
            "Aggregated play events"
        );
        summary
    }
}
