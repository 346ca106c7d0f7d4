//! Configuration loading from YAML or TOML files with environment overrides.

use crate::schema::Config;
use crate::validation::{ConfigValidator, ValidationIssue};
use std::env;
use std::path::{Path, PathBuf};
use streamstats_common::{Result as StatsResult, StatsError};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "STREAMSTATS_CONFIG_PATH";

/// File names probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["streamstats.yaml", "streamstats.yml", "streamstats.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ConfigError> for StatsError {
    fn from(err: ConfigError) -> Self {
        Self::config_with_source(err.to_string(), err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment variable
    /// overrides applied on top, then validate it.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::parse_file(path)?;
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config).map_err(ConfigError::Validation)?;

        debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Resolve and load the configuration.
    ///
    /// Resolution order: `explicit`, then `STREAMSTATS_CONFIG_PATH`, then the
    /// first existing file of [`DEFAULT_CONFIG_FILES`], then built-in defaults.
    /// Environment overrides apply in every case.
    pub fn load(explicit: Option<&Path>) -> StatsResult<Config> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .or_else(|| {
                DEFAULT_CONFIG_FILES
                    .iter()
                    .map(PathBuf::from)
                    .find(|candidate| candidate.exists())
            });

        let config = if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration");
            Self::load_config(&path)?
        } else {
            debug!("No configuration file found, using defaults");
            Self::from_defaults()?
        };

        Ok(config)
    }

    /// Defaults with environment overrides, validated.
    pub fn from_defaults() -> Result<Config, ConfigError> {
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Parse a file without overrides or validation; the format follows the
    /// extension.
    pub fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;

        match extension.as_str() {
            "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
            "toml" => Ok(toml::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                other.to_string()
            })),
        }
    }

    /// Apply process environment overrides to configuration.
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |name| env::var(name).ok())
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timezone) = lookup("STREAMSTATS_TIMEZONE") {
            config.aggregation.timezone = timezone;
        }

        if let Some(locale) = lookup("STREAMSTATS_LOCALE") {
            config.locale = locale;
        }

        if let Some(level) = lookup("STREAMSTATS_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(parallelism) = lookup("STREAMSTATS_PARALLELISM") {
            config.import.parallelism = parallelism.trim().parse().map_err(|e| {
                ConfigError::EnvParse {
                    var: "STREAMSTATS_PARALLELISM".to_string(),
                    source: Box::new(e),
                }
            })?;
        }

        if let Some(token) = lookup("SPOTIFY_ACCESS_TOKEN") {
            config.spotify.access_token = Some(token);
        }

        if let Some(url) = lookup("SPOTIFY_API_URL") {
            config.spotify.api_base_url = url;
        }

        Ok(())
    }
}
