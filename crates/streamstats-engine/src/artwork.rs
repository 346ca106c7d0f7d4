//! Read-through cache of display images for artists and tracks.

use crate::spotify::{artist_query, track_query};
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use streamstats_common::{normalize_lookup_key, EntityKind, Result};
use streamstats_config::{ArtworkConfig, SpotifyConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Remote catalog able to resolve an image for a search query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Image URL of the best match for `query`, or `None` when the catalog
    /// has no match or the match has no image.
    async fn find_image(&self, query: &str, kind: EntityKind) -> Result<Option<String>>;
}

/// An identity whose image is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArtworkQuery {
    /// An artist by name
    Artist {
        /// Artist name
        name: String,
    },
    /// A track by title and artist
    Track {
        /// Track title
        track: String,
        /// Artist name
        artist: String,
    },
}

impl ArtworkQuery {
    /// Image of an artist.
    pub fn artist(name: impl Into<String>) -> Self {
        Self::Artist { name: name.into() }
    }

    /// Album image of a track.
    pub fn track(track: impl Into<String>, artist: impl Into<String>) -> Self {
        Self::Track {
            track: track.into(),
            artist: artist.into(),
        }
    }

    /// Catalog entity searched for.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Artist { .. } => EntityKind::Artist,
            Self::Track { .. } => EntityKind::Track,
        }
    }

    /// Whether a name is missing, in which case nothing is looked up.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Artist { name } => name.trim().is_empty(),
            Self::Track { track, artist } => track.trim().is_empty() || artist.trim().is_empty(),
        }
    }

    /// Catalog search string.
    pub fn search_query(&self) -> String {
        match self {
            Self::Artist { name } => artist_query(name.trim()),
            Self::Track { track, artist } => track_query(track.trim(), artist.trim()),
        }
    }

    /// Normalized cache key, so spelling variants in case, spacing or Unicode
    /// form share one entry.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Artist { name } => format!("artist:{}", normalize_lookup_key(name)),
            Self::Track { track, artist } => format!(
                "track:{}\u{1f}{}",
                normalize_lookup_key(track),
                normalize_lookup_key(artist)
            ),
        }
    }
}

/// Configuration for the artwork cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkCacheConfig {
    /// Maximum number of entries; unbounded when `None`
    pub max_capacity: Option<u64>,
    /// Entry lifetime; entries live as long as the cache when `None`
    pub ttl: Option<Duration>,
    /// Remember remote failures as "no image"
    pub cache_failures: bool,
    /// Deadline for one remote lookup
    pub lookup_timeout: Duration,
}

impl Default for ArtworkCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: None,
            ttl: None,
            cache_failures: true,
            lookup_timeout: Duration::from_secs(15),
        }
    }
}

impl ArtworkCacheConfig {
    /// Settings from the `artwork` and `spotify` configuration sections.
    pub fn from_config(artwork: &ArtworkConfig, spotify: &SpotifyConfig) -> Self {
        Self {
            max_capacity: artwork.max_capacity,
            ttl: artwork.ttl(),
            cache_failures: artwork.cache_failures,
            lookup_timeout: spotify.lookup_timeout(),
        }
    }
}

/// Hit and miss counters.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    remote_failures: AtomicU64,
}

impl CacheMetrics {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of lookups answered from the cache.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let total = hits + self.misses.load(Ordering::Relaxed) as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    /// Counter snapshot.
    pub fn get_stats(&self) -> HashMap<String, u64> {
        let mut stats = HashMap::new();
        stats.insert("hits".to_string(), self.hits.load(Ordering::Relaxed));
        stats.insert("misses".to_string(), self.misses.load(Ordering::Relaxed));
        stats.insert(
            "remote_failures".to_string(),
            self.remote_failures.load(Ordering::Relaxed),
        );
        stats
    }
}

/// Why a lookup produced nothing cacheable.
#[derive(Debug, thiserror::Error)]
enum LookupFailure {
    #[error("lookup timed out")]
    TimedOut,
    #[error("lookup cancelled")]
    Cancelled,
    #[error("remote failure: {0}")]
    Remote(String),
}

/// Memoizes image lookups, including "no image" answers.
///
/// Concurrent lookups of one key share a single remote call.
pub struct ArtworkCache {
    cache: Cache<String, Option<String>>,
    search: Arc<dyn CatalogSearch>,
    config: ArtworkCacheConfig,
    metrics: Arc<CacheMetrics>,
}

impl std::fmt::Debug for ArtworkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtworkCache")
            .field("config", &self.config)
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ArtworkCache {
    /// Create a cache in front of `search`
    pub fn new(config: ArtworkCacheConfig, search: Arc<dyn CatalogSearch>) -> Self {
        let mut builder = Cache::builder();
        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
            search,
            config,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Resolves the image of `query`.
    ///
    /// Blank names resolve to `None` without a remote call. Timeouts and
    /// cancellation also give `None` but leave no entry, so a later lookup
    /// tries again.
    #[instrument(skip(self, cancel), fields(key = %query.cache_key()))]
    pub async fn lookup(&self, query: &ArtworkQuery, cancel: &CancellationToken) -> Option<String> {
        if query.is_blank() {
            debug!("Blank name, skipping lookup");
            return None;
        }

        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            self.metrics.record_hit();
            debug!(found = cached.is_some(), "Artwork cache hit");
            return cached;
        }
        self.metrics.record_miss();

        let search_query = query.search_query();
        let kind = query.kind();
        let result = self
            .cache
            .try_get_with(key, self.fetch(&search_query, kind, cancel))
            .await;

        match result {
            Ok(url) => url,
            Err(failure) => {
                debug!(reason = %failure, "Lookup left uncached");
                None
            }
        }
    }

    async fn fetch(
        &self,
        search_query: &str,
        kind: EntityKind,
        cancel: &CancellationToken,
    ) -> std::result::Result<Option<String>, LookupFailure> {
        let remote = tokio::time::timeout(
            self.config.lookup_timeout,
            self.search.find_image(search_query, kind),
        );

        tokio::select! {
            () = cancel.cancelled() => Err(LookupFailure::Cancelled),
            outcome = remote => match outcome {
                Err(_) => {
                    warn!(query = search_query, "Artwork lookup timed out");
                    Err(LookupFailure::TimedOut)
                }
                Ok(Ok(url)) => Ok(url),
                Ok(Err(e)) => {
                    self.metrics.record_remote_failure();
                    warn!(query = search_query, error = %e, "Artwork lookup failed");
                    if self.config.cache_failures {
                        Ok(None)
                    } else {
                        Err(LookupFailure::Remote(e.to_string()))
                    }
                }
            },
        }
    }

    /// Cached answer for `query`, without a remote call.
    pub async fn peek(&self, query: &ArtworkQuery) -> Option<Option<String>> {
        self.cache.get(&query.cache_key()).await
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Hit and miss counters.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    /// Counters plus the current entry count.
    pub async fn stats(&self) -> HashMap<String, u64> {
        self.cache.run_pending_tasks().await;
        let mut stats = self.metrics.get_stats();
        stats.insert("entry_count".to_string(), self.cache.entry_count());
        stats
    }
}
