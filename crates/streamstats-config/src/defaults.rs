//! Type-safe default values.

use crate::schema::*;
use streamstats_common::LoggingConfig;

/// Default length of the top tracks and top artists rankings.
pub const DEFAULT_TOP_LIMIT: usize = 10;
/// Default display time zone.
pub const DEFAULT_TIMEZONE: &str = "UTC";
/// Default locale.
pub const DEFAULT_LOCALE: &str = "en-US";
/// Default Spotify Web API base URL.
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

impl Default for Config {
    fn default() -> Self {
        Self {
            import: ImportConfig::default(),
            aggregation: AggregationConfig::default(),
            spotify: SpotifyConfig::default(),
            artwork: ArtworkConfig::default(),
            logging: LoggingConfig::default(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            parallelism: 1,
            read_timeout_secs: 30,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            top_limit: DEFAULT_TOP_LIMIT,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            access_token: None,
            timeout_secs: 10,
            rate_limit_per_sec: 10,
            max_retries: 3,
            lookup_timeout_secs: 15,
        }
    }
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            max_capacity: None,
            ttl_secs: None,
            cache_failures: true,
        }
    }
}
