//! Configuration signatures used to deduplicate fetcher instances.

use crate::fetcher::FetcherConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a fetcher configuration.
///
/// Two fetchers with the same signature share one queue, cache and timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchSignature(String);

impl BatchSignature {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Hash the provider dedup key together with every option that changes behavior.
    ///
    /// The key codec and event sink are not part of the signature.
    pub fn derive(provider_key: &str, batchable: bool, config: &FetcherConfig) -> Self {
        let mut parts: BTreeMap<&str, String> = BTreeMap::new();
        parts.insert("provider", provider_key.to_string());
        parts.insert("batchable", batchable.to_string());
        parts.insert("debounce_ms", config.debounce.as_millis().to_string());
        parts.insert("cache_ttl_ms", config.cache_ttl.as_millis().to_string());
        parts.insert("retries", config.retries.to_string());
        parts.insert("retry_delay_ms", config.retry_delay.as_millis().to_string());
        let canonical = serde_json::to_string(&parts).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BatchSignature {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BatchSignature {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
