//! Configuration schema definitions using serde.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use streamstats_common::LoggingConfig;
use validator::Validate;

/// Main configuration structure for streamstats.
///
/// Every section is optional in the file; missing sections and fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Import batch configuration.
    #[validate]
    pub import: ImportConfig,
    /// Aggregation configuration.
    #[validate]
    pub aggregation: AggregationConfig,
    /// Spotify Web API configuration.
    #[validate]
    pub spotify: SpotifyConfig,
    /// Artwork lookup cache configuration.
    #[validate]
    pub artwork: ArtworkConfig,
    /// Logging configuration.
    #[validate(custom(function = "crate::validation::validate_logging"))]
    pub logging: LoggingConfig,
    /// Language code for localization.
    #[validate(custom(function = "crate::validation::validate_locale"))]
    pub locale: String,
}

/// Import batch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImportConfig {
    /// Number of files read and parsed concurrently; 1 means strictly sequential.
    #[validate(range(min = 1, max = 64, message = "must be between 1 and 64"))]
    pub parallelism: usize,
    /// Upper bound on reading one file, in seconds.
    #[validate(range(min = 1, message = "must be positive"))]
    pub read_timeout_secs: u64,
}

impl ImportConfig {
    /// Per-file read deadline.
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Aggregation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AggregationConfig {
    /// Length of the top tracks and top artists rankings.
    #[validate(range(min = 1, message = "must be positive"))]
    pub top_limit: usize,
    /// IANA zone used for calendar, hour and weekday bucketing.
    #[validate(custom(function = "crate::validation::validate_timezone"))]
    pub timezone: String,
}

/// Spotify Web API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Base URL of the Web API, without the trailing `/search`.
    #[validate(url(message = "must be a valid URL"))]
    #[validate(custom(function = "crate::validation::validate_http_scheme"))]
    pub api_base_url: String,
    /// Bearer token obtained out of band.
    #[validate(custom(function = "crate::validation::validate_token", message = "must not be blank"))]
    pub access_token: Option<String>,
    /// HTTP request timeout in seconds.
    #[validate(range(min = 1, message = "must be positive"))]
    pub timeout_secs: u64,
    /// Maximum requests per second.
    #[validate(range(min = 1, message = "must be positive"))]
    pub rate_limit_per_sec: u32,
    /// Retries for transient failures.
    pub max_retries: usize,
    /// Upper bound on one artwork lookup, retries included, in seconds.
    #[validate(range(min = 1, message = "must be positive"))]
    pub lookup_timeout_secs: u64,
}

impl SpotifyConfig {
    /// HTTP request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Deadline for one artwork lookup.
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

/// Artwork lookup cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Maximum number of cached entries; unbounded when absent.
    #[validate(range(min = 1, message = "must be positive when set"))]
    pub max_capacity: Option<u64>,
    /// Entry lifetime in seconds; entries live for the whole session when absent.
    #[validate(range(min = 1, message = "must be positive when set"))]
    pub ttl_secs: Option<u64>,
    /// Whether failed remote lookups are remembered as "no image".
    pub cache_failures: bool,
}

impl ArtworkConfig {
    /// Entry lifetime, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}
