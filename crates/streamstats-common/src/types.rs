//! Common type definitions for domain modeling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: u64 = 60_000;

/// One historical playback record from a listening-history export.
///
/// Field names serialize with the export's camelCase spelling so a parsed
/// dataset can be written back out in the "simple" export schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayEvent {
    /// When playback ended, verbatim from the source (`YYYY-MM-DD HH:MM` or ISO-8601).
    pub end_time: String,
    /// Artist credited on the track.
    pub artist_name: String,
    /// Track title.
    pub track_name: String,
    /// How long the track played, in milliseconds.
    pub ms_played: u64,
}

impl PlayEvent {
    /// Creates a play event.
    pub fn new(
        end_time: impl Into<String>,
        artist_name: impl Into<String>,
        track_name: impl Into<String>,
        ms_played: u64,
    ) -> Self {
        Self {
            end_time: end_time.into(),
            artist_name: artist_name.into(),
            track_name: track_name.into(),
            ms_played,
        }
    }

    /// Whether the record carries enough data to be kept in a dataset.
    ///
    /// Artist and track must be non-empty and something must have played.
    pub fn is_retainable(&self) -> bool {
        !self.artist_name.is_empty() && !self.track_name.is_empty() && self.ms_played > 0
    }

    /// Identity of the track this event refers to.
    pub fn track_identity(&self) -> (&str, &str) {
        (&self.track_name, &self.artist_name)
    }
}

/// Kind of catalog entity an image lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An artist; its own images are used.
    Artist,
    /// A track; its album's images are used.
    Track,
}

impl EntityKind {
    /// Value of the `type` query parameter for catalog searches.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Track => "track",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
