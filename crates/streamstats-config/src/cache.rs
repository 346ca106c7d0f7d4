//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::loader::ConfigError;
use crate::schema::Config;
use crate::validation::ConfigValidator;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Thread-safe configuration cache using arc-swap for lock-free reads.
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Gets the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Validates and installs a new configuration. The current one is kept
    /// when validation fails.
    pub fn update(&self, config: Config) -> Result<(), ConfigError> {
        ConfigValidator::validate(&config).map_err(ConfigError::Validation)?;
        self.config.store(Arc::new(config));
        Ok(())
    }

    /// Applies `f` to a copy of the current configuration and installs the
    /// result if it validates.
    pub fn modify<F>(&self, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut next = Config::clone(&self.get());
        f(&mut next);
        self.update(next)
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_update_keeps_current() {
        let cache = ConfigCache::default();
        let result = cache.modify(|config| config.import.parallelism = 0);

        assert!(result.is_err());
        assert_eq!(cache.get().import.parallelism, 1);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let cache = ConfigCache::default();
        let before = cache.get();
        cache.modify(|config| config.locale = "fr-FR".to_string()).unwrap();

        assert_eq!(before.locale, "en-US");
        assert_eq!(cache.get().locale, "fr-FR");
    }
}
