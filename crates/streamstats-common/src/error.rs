//! Error types and utilities for streamstats

use thiserror::Error;

/// Result type alias for streamstats operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Boxed error source carried by the richer variants.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for streamstats operations
#[derive(Error, Debug)]
pub enum StatsError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, etc.)
    #[error("Network error: {message}")]
    Network {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },

    /// Spotify Web API errors
    #[error("Spotify API error: {message}")]
    Spotify {
        /// Human readable description
        message: String,
        /// HTTP status returned by the API, when there was one
        status_code: Option<u16>,
    },

    /// Listening-history import errors
    #[error("Import error: {message}")]
    Import {
        /// Human readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedSource>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internationalization and localization errors
    #[error("Localization error: {message}")]
    Localization {
        /// Human readable description
        message: String,
        /// Locale involved, if any
        locale: Option<String>,
    },

    /// Validation errors for user input or data
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable description
        message: String,
        /// Offending field, if any
        field: Option<String>,
    },
}

impl StatsError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new Spotify API error with status code
    pub fn spotify_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Spotify {
            message: msg.into(),
            status_code: Some(status),
        }
    }

    /// Create a new import error with source
    pub fn import_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Import {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new localization error
    pub fn localization(msg: impl Into<String>) -> Self {
        Self::Localization {
            message: msg.into(),
            locale: None,
        }
    }

    /// Create a new localization error with locale
    pub fn localization_with_locale(msg: impl Into<String>, locale: impl Into<String>) -> Self {
        Self::Localization {
            message: msg.into(),
            locale: Some(locale.into()),
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// HTTP status carried by the error, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Spotify { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Whether retrying the failed operation could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Spotify {
                status_code: Some(status),
                ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// Error conversion implementations for external types

/// Convert from `reqwest::Error` to `StatsError`
impl From<reqwest::Error> for StatsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timeout", err)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map_or(0, |s| s.as_u16());
            Self::network_with_source(format!("HTTP error: {status_code}"), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}
