//! Ad-hoc filters and recomputation of the summary over the matching subset.

use crate::aggregator::Aggregator;
use crate::summary::AggregatedSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use streamstats_common::{contains_ignore_case, PlayEvent, MS_PER_MINUTE};
use tracing::{debug, instrument};

/// Conjunction of optional predicates over play events.
///
/// Empty search strings, absent dates and a zero minimum impose no
/// constraint, so `PlayFilter::default()` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayFilter {
    /// Case-insensitive substring of the artist name
    pub artist_search: String,
    /// Case-insensitive substring of the track name
    pub track_search: String,
    /// First included day
    pub date_from: Option<NaiveDate>,
    /// Last included day
    pub date_to: Option<NaiveDate>,
    /// Minimum duration of a single play, in minutes
    pub min_playtime: u64,
}

impl PlayFilter {
    /// A filter that matches every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to artists whose name contains `needle`.
    #[must_use]
    pub fn with_artist(mut self, needle: impl Into<String>) -> Self {
        self.artist_search = needle.into();
        self
    }

    /// Restricts to tracks whose name contains `needle`.
    #[must_use]
    pub fn with_track(mut self, needle: impl Into<String>) -> Self {
        self.track_search = needle.into();
        self
    }

    /// Sets the inclusive date range; either end may be open.
    #[must_use]
    pub const fn with_dates(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Sets the minimum single-play duration in minutes.
    #[must_use]
    pub const fn with_min_playtime(mut self, minutes: u64) -> Self {
        self.min_playtime = minutes;
        self
    }

    /// Whether any predicate constrains the dataset.
    pub fn is_active(&self) -> bool {
        !self.artist_search.trim().is_empty()
            || !self.track_search.trim().is_empty()
            || self.date_from.is_some()
            || self.date_to.is_some()
            || self.min_playtime > 0
    }

    /// Whether `event` satisfies every predicate. Date bounds compare the
    /// event's local calendar day; events without a parseable timestamp are
    /// not excluded by them.
    pub fn matches(&self, event: &PlayEvent, aggregator: &Aggregator) -> bool {
        let artist = self.artist_search.trim();
        if !artist.is_empty() && !contains_ignore_case(&event.artist_name, artist) {
            return false;
        }

        let track = self.track_search.trim();
        if !track.is_empty() && !contains_ignore_case(&event.track_name, track) {
            return false;
        }

        if self.min_playtime > 0
            && event.ms_played < self.min_playtime.saturating_mul(MS_PER_MINUTE)
        {
            return false;
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            if let Some(day) = aggregator.local_time(event).map(|t| t.date()) {
                if self.date_from.is_some_and(|from| day < from)
                    || self.date_to.is_some_and(|to| day > to)
                {
                    return false;
                }
            }
        }

        true
    }

    /// The matching events, in input order.
    pub fn apply(&self, events: &[PlayEvent], aggregator: &Aggregator) -> Vec<PlayEvent> {
        if !self.is_active() {
            return events.to_vec();
        }
        events
            .iter()
            .filter(|event| self.matches(event, aggregator))
            .cloned()
            .collect()
    }
}

/// A filtered subset together with its own summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView {
    /// Matching events, in input order
    pub events: Vec<PlayEvent>,
    /// Summary of `events` alone
    pub summary: AggregatedSummary,
    /// Size of the dataset the filter was applied to
    pub total_available: usize,
}

impl FilteredView {
    /// Filters `events` and recomputes the summary of the result with the
    /// same aggregator used for the full dataset.
    #[instrument(skip_all, fields(total = events.len()))]
    pub fn compute(events: &[PlayEvent], filter: &PlayFilter, aggregator: &Aggregator) -> Self {
        let matching = filter.apply(events, aggregator);
        let summary = aggregator.aggregate(&matching);
        debug!(matching = matching.len(), active = filter.is_active(), "Recomputed filtered view");
        Self {
            events: matching,
            summary,
            total_available: events.len(),
        }
    }

    /// Number of matching events.
    pub fn matching(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamstats_common::test_utils::history_fixtures;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_filter_is_identity() {
        let events = history_fixtures::sample_events();
        let filter = PlayFilter::default();
        assert!(!filter.is_active());
        assert_eq!(filter.apply(&events, &Aggregator::new()), events);
    }

    #[test]
    fn test_blank_search_is_inactive() {
        let filter = PlayFilter::new().with_artist("   ");
        assert!(!filter.is_active());
    }

    #[test]
    fn test_artist_and_track_search_ignore_case() {
        let events = history_fixtures::sample_events();
        let aggregator = Aggregator::new();

        let daft = PlayFilter::new().with_artist("daft");
        assert_eq!(daft.apply(&events, &aggregator).len(), 3);

        let both = PlayFilter::new().with_artist("DAFT").with_track("one more");
        assert_eq!(both.apply(&events, &aggregator).len(), 2);

        let none = PlayFilter::new().with_artist("justice").with_track("one more");
        assert!(none.apply(&events, &aggregator).is_empty());
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let events = history_fixtures::sample_events();
        let aggregator = Aggregator::new();
        let filter = PlayFilter::new().with_dates(Some(date(2024, 1, 2)), Some(date(2024, 1, 6)));

        let kept = filter.apply(&events, &aggregator);
        let tracks: Vec<&str> = kept.iter().map(|e| e.track_name.as_str()).collect();
        // The undated Phoenix play is not excluded by date bounds.
        assert_eq!(
            tracks,
            vec!["D.A.N.C.E.", "One More Time", "La femme d'argent", "1901"]
        );
    }

    #[test]
    fn test_open_ended_date_range() {
        let events = history_fixtures::sample_events();
        let aggregator = Aggregator::new();
        let filter = PlayFilter::new().with_dates(Some(date(2024, 2, 1)), None);
        assert_eq!(filter.apply(&events, &aggregator).len(), 3);
    }

    #[test]
    fn test_min_playtime_is_inclusive() {
        let events = vec![
            PlayEvent::new("2024-01-01 10:00", "A", "Short", 239_999),
            PlayEvent::new("2024-01-01 10:05", "A", "Exact", 240_000),
        ];
        let filter = PlayFilter::new().with_min_playtime(4);
        let kept = filter.apply(&events, &Aggregator::new());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].track_name, "Exact");
    }

    #[test]
    fn test_filtered_view_recomputes_summary() {
        let events = history_fixtures::sample_events();
        let view = FilteredView::compute(
            &events,
            &PlayFilter::new().with_artist("air"),
            &Aggregator::new(),
        );

        assert_eq!(view.matching(), 2);
        assert_eq!(view.total_available, 8);
        assert_eq!(view.summary.total_streams, 2);
        assert_eq!(view.summary.unique_artists, 1);
        assert_eq!(view.summary.top_artists[0].name, "Air");
    }

    #[test]
    fn test_empty_result_gives_zero_summary() {
        let events = history_fixtures::sample_events();
        let view = FilteredView::compute(
            &events,
            &PlayFilter::new().with_min_playtime(60),
            &Aggregator::new(),
        );

        assert!(view.events.is_empty());
        assert!(view.summary.is_empty());
        assert_eq!(view.summary.hourly_data.len(), 24);
        assert_eq!(view.summary.weekday_data.len(), 7);
    }

    #[test]
    fn test_deserializes_partial_filter() {
        let filter: PlayFilter =
            serde_json::from_str(r#"{"artistSearch":"air","dateFrom":"2024-01-01"}"#).unwrap();
        assert_eq!(filter.artist_search, "air");
        assert_eq!(filter.date_from, Some(date(2024, 1, 1)));
        assert_eq!(filter.min_playtime, 0);
    }
}
