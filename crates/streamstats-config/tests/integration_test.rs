//! Integration tests for streamstats-config crate.

use std::io::Write;
use streamstats_config::{Config, ConfigCache, ConfigLoader, ConfigValidator};

#[test]
fn test_default_config_validation() {
    let mut config = Config::default();
    assert!(ConfigValidator::validate(&config).is_ok());

    config.aggregation.top_limit = 0;
    config.spotify.rate_limit_per_sec = 0;
    let issues = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(issues.len(), 2);
}

#[test]
fn test_config_cache() {
    let config = Config::default();
    let cache = ConfigCache::new(config.clone());

    let cached_config = cache.get();
    assert_eq!(cached_config.locale, config.locale);

    let mut new_config = config;
    new_config.locale = "fr-FR".to_string();
    cache.update(new_config).unwrap();

    assert_eq!(cache.get().locale, "fr-FR");
}

#[test]
fn test_full_yaml_document() {
    let yaml = r#"
import:
  parallelism: 2
  read_timeout_secs: 5
aggregation:
  top_limit: 25
  timezone: America/Los_Angeles
spotify:
  api_base_url: https://api.spotify.com/v1
  timeout_secs: 5
  rate_limit_per_sec: 2
  max_retries: 1
  lookup_timeout_secs: 8
artwork:
  max_capacity: 1000
  cache_failures: true
logging:
  level: "streamstats_engine=debug,info"
  format: json
locale: fr-FR
"#;
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = ConfigLoader::parse_file(file.path()).unwrap();
    assert!(ConfigValidator::validate(&config).is_ok());
    assert_eq!(config.aggregation.top_limit, 25);
    assert_eq!(config.import.read_timeout().as_secs(), 5);
    assert_eq!(config.spotify.lookup_timeout().as_secs(), 8);
    assert_eq!(config.artwork.max_capacity, Some(1000));
    assert_eq!(
        config.logging.format,
        streamstats_common::LogFormat::Json
    );
}

#[test]
fn test_serialized_config_round_trips_through_yaml() {
    let mut config = Config::default();
    config.artwork.ttl_secs = Some(600);
    let text = serde_yaml::to_string(&config).unwrap();

    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let parsed = ConfigLoader::parse_file(file.path()).unwrap();

    assert_eq!(parsed, config);
}
