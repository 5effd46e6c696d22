//! Fetcher configuration.

use crate::error::ErrorContext;
use crate::resilience::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_DEBOUNCE_MS: &str = "BATCHED_FETCHER_DEBOUNCE_MS";
pub const ENV_CACHE_TTL_MS: &str = "BATCHED_FETCHER_CACHE_TTL_MS";
pub const ENV_RETRIES: &str = "BATCHED_FETCHER_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "BATCHED_FETCHER_RETRY_DELAY_MS";

/// Timing and retry options of one fetcher.
///
/// Serialized with millisecond fields so it can live in YAML/JSON config files:
///
/// ```yaml
/// debounce_time_ms: 50
/// cache_ttl_ms: 60000
/// retries: 3
/// retry_delay_ms: 100
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Quiet period after the last request before a batch is flushed.
    #[serde(rename = "debounce_time_ms", with = "millis")]
    pub debounce: Duration,
    /// How long resolved values stay cached. Zero disables caching.
    #[serde(rename = "cache_ttl_ms", with = "millis")]
    pub cache_ttl: Duration,
    /// Additional provider attempts after the first.
    pub retries: u32,
    /// Base of the exponential backoff between attempts.
    #[serde(rename = "retry_delay_ms", with = "millis")]
    pub retry_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            cache_ttl: Duration::ZERO,
            retries: 2,
            retry_delay: Duration::from_millis(200),
        }
    }
}

impl FetcherConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_debounce(mut self, d: Duration) -> Self {
        self.debounce = d;
        self
    }
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
    pub fn with_retries(mut self, n: u32) -> Self {
        self.retries = n;
        self
    }
    pub fn with_retry_delay(mut self, d: Duration) -> Self {
        self.retry_delay = d;
        self
    }

    pub fn caching_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.retry_delay)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                "invalid fetcher config",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("yaml"),
            )
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                "invalid fetcher config",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("json"),
            )
        })
    }

    /// Defaults overridden by `BATCHED_FETCHER_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Override fields from the environment:
    /// - `BATCHED_FETCHER_DEBOUNCE_MS`
    /// - `BATCHED_FETCHER_CACHE_TTL_MS`
    /// - `BATCHED_FETCHER_RETRIES`
    /// - `BATCHED_FETCHER_RETRY_DELAY_MS`
    ///
    /// Unset or unparseable variables leave the field unchanged.
    pub fn apply_env(mut self) -> Self {
        if let Some(ms) = env_u64(ENV_DEBOUNCE_MS) {
            self.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64(ENV_CACHE_TTL_MS) {
            self.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(n) = std::env::var(ENV_RETRIES)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
        {
            self.retries = n;
        }
        if let Some(ms) = env_u64(ENV_RETRY_DELAY_MS) {
            self.retry_delay = Duration::from_millis(ms);
        }
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FetcherConfig::default();
        assert_eq!(cfg.debounce, Duration::from_millis(100));
        assert_eq!(cfg.cache_ttl, Duration::ZERO);
        assert_eq!(cfg.retries, 2);
        assert_eq!(cfg.retry_delay, Duration::from_millis(200));
        assert!(!cfg.caching_enabled());
    }

    #[test]
    fn test_builder() {
        let cfg = FetcherConfig::new()
            .with_debounce(Duration::from_millis(10))
            .with_cache_ttl(Duration::from_secs(60))
            .with_retries(0)
            .with_retry_delay(Duration::from_millis(5));
        assert!(cfg.caching_enabled());
        assert_eq!(cfg.retry_policy(), RetryPolicy::new(0, Duration::from_millis(5)));
    }

    #[test]
    fn test_from_yaml_partial() {
        let cfg = FetcherConfig::from_yaml_str("debounce_time_ms: 25\ncache_ttl_ms: 1000\n").unwrap();
        assert_eq!(cfg.debounce, Duration::from_millis(25));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(1));
        assert_eq!(cfg.retries, 2);
    }

    #[test]
    fn test_from_json() {
        let cfg = FetcherConfig::from_json_str(r#"{"retries": 5, "retry_delay_ms": 50}"#).unwrap();
        assert_eq!(cfg.retries, 5);
        assert_eq!(cfg.retry_delay, Duration::from_millis(50));
        assert_eq!(cfg.debounce, Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let err = FetcherConfig::from_json_str(r#"{"retries": "many"}"#).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(err.context().and_then(|c| c.source.as_deref()), Some("json"));
    }

    #[test]
    fn test_serializes_millis() {
        let json = serde_json::to_value(FetcherConfig::default()).unwrap();
        assert_eq!(json["debounce_time_ms"], 100);
        assert_eq!(json["cache_ttl_ms"], 0);
        assert_eq!(json["retry_delay_ms"], 200);
    }

    #[test]
    fn test_apply_env() {
        std::env::set_var(ENV_DEBOUNCE_MS, "30");
        std::env::set_var(ENV_RETRIES, "not-a-number");
        let cfg = FetcherConfig::from_env();
        std::env::remove_var(ENV_DEBOUNCE_MS);
        std::env::remove_var(ENV_RETRIES);

        assert_eq!(cfg.debounce, Duration::from_millis(30));
        assert_eq!(cfg.retries, 2);
    }
}
