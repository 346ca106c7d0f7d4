//! Spotify Web API catalog search with rate limiting and retries
//!
//! Only the read-only `/search` endpoint is used. Authentication is a bearer
//! token obtained through a [`TokenProvider`]; the OAuth exchange that issues
//! tokens lives outside this crate.

use crate::artwork::CatalogSearch;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use streamstats_common::{EntityKind, Result, StatsError};
use streamstats_config::SpotifyConfig;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};

/// Image heights preferred for display, in pixels.
const PREFERRED_IMAGE_HEIGHTS: [u32; 2] = [64, 300];

/// Source of bearer tokens for the Web API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token.
    async fn access_token(&self) -> Result<String>;

    /// Obtains a fresh token after the API rejected the current one.
    async fn refresh(&self) -> Result<String>;
}

/// A fixed token, e.g. from `SPOTIFY_ACCESS_TOKEN`. It cannot be refreshed.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    async fn refresh(&self) -> Result<String> {
        Err(StatsError::spotify_with_status(
            "Access token expired and cannot be refreshed",
            StatusCode::UNAUTHORIZED.as_u16(),
        ))
    }
}

/// Configuration for the Spotify client
#[derive(Debug, Clone)]
pub struct SpotifyClientConfig {
    /// Base URL of the Web API (e.g. "https://api.spotify.com/v1")
    pub base_url: String,
    /// Request timeout (default: 10s)
    pub timeout: Duration,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u32,
    /// Maximum number of retry attempts for transient failures (default: 3)
    pub max_retries: usize,
}

impl Default for SpotifyClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            timeout: Duration::from_secs(10),
            rate_limit_per_sec: 10,
            max_retries: 3,
        }
    }
}

impl SpotifyClientConfig {
    /// Create a configuration for the given API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Client settings from the `spotify` configuration section
    pub fn from_config(config: &SpotifyConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
            rate_limit_per_sec: config.rate_limit_per_sec,
            max_retries: config.max_retries,
        }
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rate limit
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Set the maximum retry attempts
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// One image of an artist or album.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogImage {
    /// Image location
    pub url: String,
    /// Height in pixels, when reported
    pub height: Option<u32>,
    /// Width in pixels, when reported
    pub width: Option<u32>,
}

/// A search hit reduced to what image resolution needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Artist or track name
    pub name: String,
    /// Artist images, or the album images of a track
    pub images: Vec<CatalogImage>,
}

impl CatalogItem {
    /// The display image: the first at a preferred height, else the first.
    pub fn preferred_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|image| {
                image
                    .height
                    .is_some_and(|h| PREFERRED_IMAGE_HEIGHTS.contains(&h))
            })
            .or_else(|| self.images.first())
            .map(|image| image.url.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Option<Page<ArtistObject>>,
    tracks: Option<Page<TrackObject>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
    #[serde(default)]
    images: Vec<CatalogImage>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: String,
    album: Option<AlbumObject>,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    #[serde(default)]
    images: Vec<CatalogImage>,
}

impl SearchResponse {
    fn into_items(self, kind: EntityKind) -> Vec<CatalogItem> {
        match kind {
            EntityKind::Artist => self
                .artists
                .map(|page| page.items)
                .unwrap_or_default()
                .into_iter()
                .map(|artist| CatalogItem {
                    name: artist.name,
                    images: artist.images,
                })
                .collect(),
            EntityKind::Track => self
                .tracks
                .map(|page| page.items)
                .unwrap_or_default()
                .into_iter()
                .map(|track| CatalogItem {
                    name: track.name,
                    images: track.album.map(|album| album.images).unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Search query for an artist.
pub fn artist_query(artist: &str) -> String {
    format!("artist:{artist}")
}

/// Search query for a track by an artist.
pub fn track_query(track: &str, artist: &str) -> String {
    format!("track:{track} artist:{artist}")
}

/// Spotify catalog client with connection pooling and rate limiting
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    config: SpotifyClientConfig,
    tokens: Arc<dyn TokenProvider>,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a new client
    pub fn new(config: SpotifyClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StatsError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| StatsError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            tokens,
            rate_limiter,
        })
    }

    /// Create a client from configuration, authenticating with its static
    /// access token.
    pub fn from_config(config: &SpotifyConfig) -> Result<Self> {
        let token = config
            .access_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| StatsError::config("No Spotify access token configured"))?;
        Self::new(
            SpotifyClientConfig::from_config(config),
            Arc::new(StaticToken::new(token)),
        )
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    /// Search the catalog for `kind` entities matching `query`
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, kind: EntityKind, limit: u32) -> Result<Vec<CatalogItem>> {
        let params = [
            ("q", query.to_string()),
            ("type", kind.as_str().to_string()),
            ("limit", limit.to_string()),
        ];

        let token = self.tokens.access_token().await?;
        let response = match self.send_with_retry(&token, &params).await {
            Err(e) if e.status_code() == Some(StatusCode::UNAUTHORIZED.as_u16()) => {
                warn!("Access token rejected, refreshing once");
                let token = self.tokens.refresh().await?;
                self.send_with_retry(&token, &params).await?
            }
            other => other?,
        };

        let items = response.into_items(kind);
        info!(results = items.len(), "Catalog search completed");
        Ok(items)
    }

    /// Best image of the top search hit, if any
    pub async fn top_image(&self, query: &str, kind: EntityKind) -> Result<Option<String>> {
        let items = self.search(query, kind, 1).await?;
        Ok(items
            .first()
            .and_then(CatalogItem::preferred_image)
            .map(str::to_string))
    }

    /// Rate-limited request with exponential backoff on transient failures
    async fn send_with_retry(&self, token: &str, params: &[(&str, String)]) -> Result<SearchResponse> {
        let url = self.search_url();
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        RetryIf::start(
            retry_strategy,
            || async {
                self.rate_limiter.until_ready().await;
                debug!("Sending search request to {}", url);

                let response = match self.client.get(&url).bearer_auth(token).query(params).send().await {
                    Ok(response) => response,
                    Err(e) if e.is_timeout() => {
                        warn!("Request timeout, will retry: {}", e);
                        return Err(StatsError::network_with_source("Request timeout", e));
                    }
                    Err(e) => {
                        warn!("Request failed: {}", e);
                        return Err(StatsError::from(e));
                    }
                };

                let status = response.status();
                if status.is_success() {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str::<SearchResponse>(&body)?);
                }

                let err = StatsError::spotify_with_status(
                    format!("Search returned {status}"),
                    status.as_u16(),
                );
                if err.is_transient() {
                    warn!("Server error, will retry: {}", status);
                } else {
                    error!("Client error: {}", status);
                }
                Err(err)
            },
            StatsError::is_transient,
        )
        .await
    }
}

#[async_trait]
impl CatalogSearch for SpotifyClient {
    async fn find_image(&self, query: &str, kind: EntityKind) -> Result<Option<String>> {
        self.top_image(query, kind).await
    }
}
