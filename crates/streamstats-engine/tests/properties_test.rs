//! Property tests over parsing, aggregation and filtering.

use proptest::prelude::*;
use streamstats_common::round_minutes;
use streamstats_common::test_utils::property_testing::{dataset_strategy, end_time_strategy};
use streamstats_engine::parser::{parse_csv, parse_json};
use streamstats_engine::{Aggregator, PlayFilter};

/// A JSON record with possibly empty names and a possibly zero duration.
fn raw_record() -> impl Strategy<Value = (String, String, String, u64)> {
    (
        end_time_strategy(),
        prop_oneof![Just(String::new()), "[A-Za-z][A-Za-z ]{0,12}"],
        prop_oneof![Just(String::new()), "[A-Za-z][A-Za-z ]{0,12}"],
        prop_oneof![Just(0u64), 1u64..1_000_000],
    )
}

proptest! {
    #[test]
    fn retained_records_are_complete(records in prop::collection::vec(raw_record(), 0..30)) {
        let json = serde_json::Value::Array(
            records
                .iter()
                .map(|(end_time, artist, track, ms)| serde_json::json!({
                    "endTime": end_time,
                    "artistName": artist,
                    "trackName": track,
                    "msPlayed": ms,
                }))
                .collect(),
        );

        let events = parse_json(&json.to_string());
        for event in &events {
            prop_assert!(!event.artist_name.is_empty());
            prop_assert!(!event.track_name.is_empty());
            prop_assert!(event.ms_played > 0);
        }
        let expected = records
            .iter()
            .filter(|(_, artist, track, ms)| !artist.is_empty() && !track.is_empty() && *ms > 0)
            .count();
        prop_assert_eq!(events.len(), expected);
    }

    #[test]
    fn detailed_keys_parse_like_simple_keys(
        end_time in end_time_strategy(),
        artist in "[A-Za-z][A-Za-z ]{0,12}[A-Za-z]",
        track in "[A-Za-z][A-Za-z ]{0,12}[A-Za-z]",
        ms in 1u64..1_000_000,
    ) {
        let simple = serde_json::json!([{
            "endTime": end_time,
            "artistName": artist,
            "trackName": track,
            "msPlayed": ms,
        }]);
        let detailed = serde_json::json!([{
            "ts": end_time,
            "master_metadata_album_artist_name": artist,
            "master_metadata_track_name": track,
            "ms_played": ms,
        }]);
        prop_assert_eq!(parse_json(&simple.to_string()), parse_json(&detailed.to_string()));

        let simple_csv = format!("endTime,artistName,trackName,msPlayed\n{end_time},{artist},{track},{ms}\n");
        let detailed_csv = format!(
            "ts,master_metadata_album_artist_name,master_metadata_track_name,ms_played\n{end_time},{artist},{track},{ms}\n"
        );
        prop_assert_eq!(parse_csv(&simple_csv), parse_csv(&detailed_csv));
    }

    #[test]
    fn aggregation_is_idempotent(events in dataset_strategy(60)) {
        let aggregator = Aggregator::new();
        let first = serde_json::to_vec(&aggregator.aggregate(&events)).unwrap();
        let second = serde_json::to_vec(&aggregator.aggregate(&events)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn totals_are_conserved(events in dataset_strategy(60)) {
        let summary = Aggregator::new().aggregate(&events);
        prop_assert_eq!(summary.total_streams, events.len() as u64);
        prop_assert_eq!(
            summary.total_minutes,
            round_minutes(events.iter().map(|e| e.ms_played).sum())
        );

        let dated = events.iter().filter(|e| !e.end_time.is_empty()).count() as u64;
        prop_assert_eq!(summary.daily_streams(), dated);
        prop_assert_eq!(summary.monthly_data.iter().map(|m| m.streams).sum::<u64>(), dated);
    }

    #[test]
    fn hour_and_weekday_slots_are_fixed(events in dataset_strategy(40)) {
        let summary = Aggregator::new().aggregate(&events);
        prop_assert_eq!(summary.hourly_data.len(), 24);
        prop_assert_eq!(summary.weekday_data.len(), 7);
        prop_assert!(summary.top_tracks.len() <= 10);
        prop_assert!(summary.top_artists.len() <= 10);
    }

    #[test]
    fn empty_filter_keeps_everything(events in dataset_strategy(40)) {
        let filter = PlayFilter::default();
        prop_assert_eq!(filter.apply(&events, &Aggregator::new()), events);
    }

    #[test]
    fn filter_matches_subset(events in dataset_strategy(40), needle in "[a-z]{1,3}") {
        let aggregator = Aggregator::new();
        let kept = PlayFilter::new().with_artist(needle.clone()).apply(&events, &aggregator);
        prop_assert!(kept.len() <= events.len());
        for event in &kept {
            prop_assert!(event.artist_name.to_lowercase().contains(&needle));
        }
    }
}
