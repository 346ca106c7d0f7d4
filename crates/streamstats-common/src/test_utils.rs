//! Test utilities and shared test helpers for streamstats.
//!
//! This module provides common testing utilities, fixtures, and helper functions
//! that can be used across all crates in the workspace for unit and integration testing.

use crate::PlayEvent;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Listening-history fixtures shared by the parser, aggregator and CLI tests.
pub mod history_fixtures {
    use super::PlayEvent;

    /// Header of the "simple" export schema.
    pub const SIMPLE_CSV_HEADER: &str = "endTime,artistName,trackName,msPlayed";

    /// Two plays by one artist, five minutes in total.
    pub fn two_play_csv() -> String {
        format!(
            "{SIMPLE_CSV_HEADER}\n\
             2024-01-05T10:00:00, ArtistA, TrackA, 180000\n\
             2024-01-05T10:05:00, ArtistA, TrackB, 90000\n"
        )
    }

    /// The same two plays in the "detailed" export schema.
    pub fn two_play_extended_json() -> String {
        r#"[
  {
    "ts": "2024-01-05T10:00:00",
    "master_metadata_album_artist_name": "ArtistA",
    "master_metadata_track_name": "TrackA",
    "ms_played": 180000
  },
  {
    "ts": "2024-01-05T10:05:00",
    "master_metadata_album_artist_name": "ArtistA",
    "master_metadata_track_name": "TrackB",
    "ms_played": 90000
  }
]"#
        .to_string()
    }

    /// A file that parses but retains nothing.
    pub fn empty_history_json() -> String {
        r#"[{"endTime":"2024-01-05 10:00","artistName":"","trackName":"Silence","msPlayed":0}]"#
            .to_string()
    }

    /// A week of plays spread over several artists, hours and days.
    pub fn sample_events() -> Vec<PlayEvent> {
        vec![
            PlayEvent::new("2024-01-01 08:15", "Daft Punk", "One More Time", 320_000),
            PlayEvent::new("2024-01-01 08:21", "Daft Punk", "Aerodynamic", 212_000),
            PlayEvent::new("2024-01-02 21:40", "Justice", "D.A.N.C.E.", 242_000),
            PlayEvent::new("2024-01-03 12:00", "Daft Punk", "One More Time", 320_000),
            PlayEvent::new("2024-01-06 23:59", "Air", "La femme d'argent", 430_000),
            PlayEvent::new("2024-02-10 07:30", "Justice", "Genesis", 234_000),
            PlayEvent::new("2024-02-11 18:05", "Air", "Sexy Boy", 298_000),
            PlayEvent::new("", "Phoenix", "1901", 193_000),
        ]
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use crate::PlayEvent;
    use proptest::prelude::*;

    /// Strategy for timestamps in either export layout, or empty.
    pub fn end_time_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (2015i32..2026, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(
                |(y, mo, d, h, mi)| format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}")
            ),
            (2015i32..2026, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60).prop_map(
                |(y, mo, d, h, mi)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:00Z")
            ),
            Just(String::new()),
        ]
    }

    /// Strategy for retained play events drawn from a small name pool so
    /// rankings see repeated identities.
    pub fn play_event_strategy() -> impl Strategy<Value = PlayEvent> {
        (
            end_time_strategy(),
            prop::sample::select(vec!["Air", "Justice", "Daft Punk", "Phoenix", "Sébastien Tellier"]),
            prop::sample::select(vec!["Intro", "Genesis", "Sexy Boy", "1901", "La ritournelle"]),
            1u64..900_000,
        )
            .prop_map(|(end_time, artist, track, ms)| PlayEvent::new(end_time, artist, track, ms))
    }

    /// Strategy for whole datasets.
    pub fn dataset_strategy(max_len: usize) -> impl Strategy<Value = Vec<PlayEvent>> {
        prop::collection::vec(play_event_strategy(), 0..max_len)
    }
}
