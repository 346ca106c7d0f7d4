//! Error types for internationalization operations

use streamstats_common::StatsError;
use thiserror::Error;

/// Errors that can occur during internationalization operations
#[derive(Error, Debug)]
pub enum I18nError {
    /// Failed to parse a language identifier
    #[error("Invalid language identifier: {0}")]
    InvalidLanguageId(String),

    /// Failed to parse a Fluent resource
    #[error("Failed to parse Fluent resource for {locale}: {errors:?}")]
    FluentParse {
        /// Locale whose resource failed
        locale: String,
        /// Parser diagnostics
        errors: Vec<String>,
    },

    /// A resource defines a message twice
    #[error("Failed to add resource for {locale}: {errors:?}")]
    BundleCreation {
        /// Locale whose bundle failed
        locale: String,
        /// Bundle diagnostics
        errors: Vec<String>,
    },

    /// Message not found in any bundle
    #[error("Message not found: {key}")]
    MessageNotFound {
        /// Message identifier
        key: String,
    },

    /// Failed to format a message
    #[error("Failed to format message '{key}': {errors:?}")]
    MessageFormat {
        /// Message identifier
        key: String,
        /// Resolver diagnostics
        errors: Vec<String>,
    },
}

/// Result type for i18n operations
pub type I18nResult<T> = Result<T, I18nError>;

impl From<I18nError> for StatsError {
    fn from(err: I18nError) -> Self {
        match err {
            I18nError::FluentParse { ref locale, .. } | I18nError::BundleCreation { ref locale, .. } => {
                Self::localization_with_locale(err.to_string(), locale.clone())
            }
            other => Self::localization(other.to_string()),
        }
    }
}
