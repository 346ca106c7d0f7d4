//! Application-wide error types using thiserror.

use streamstats_common::StatsError;
use streamstats_config::ConfigError;
use streamstats_engine::ImportError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Error from the shared library crates.
    #[error(transparent)]
    Stats(#[from] StatsError),

    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The selection could not enter an import batch.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Every file of the batch failed, so there is nothing to summarize.
    #[error("No listening data could be imported")]
    NoData,

    /// Output could not be serialized.
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output could not be serialized as YAML.
    #[error("Failed to serialize configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the command line application.
pub type CliResult<T> = Result<T, CliError>;

impl From<streamstats_i18n::I18nError> for CliError {
    fn from(err: streamstats_i18n::I18nError) -> Self {
        Self::Stats(err.into())
    }
}
