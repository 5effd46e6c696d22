//! Diagnostic events emitted by the fetch engine.

use serde::{Deserialize, Serialize};

/// Severity of a [`FetchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Typed diagnostic events. Serialized with the dotted event name under `"event"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum FetchEvent {
    #[serde(rename = "cache.hit")]
    CacheHit { key: String },
    #[serde(rename = "cache.expired")]
    CacheExpired { key: String },
    #[serde(rename = "cache.set")]
    CacheSet { key: String, ttl_ms: u64 },
    #[serde(rename = "queue.added")]
    QueueAdded { key: String, waiters: usize },
    #[serde(rename = "batch.start")]
    BatchStart { keys: Vec<String> },
    #[serde(rename = "batch.success")]
    BatchSuccess { requested: usize, returned: usize },
    #[serde(rename = "batch.missing")]
    BatchMissing { key: String },
    #[serde(rename = "batch.error")]
    BatchError { error: String, attempts: u32 },
    #[serde(rename = "retry.attempt")]
    RetryAttempt {
        attempt: u32,
        delay_ms: u64,
        error: String,
    },
}

impl FetchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FetchEvent::CacheHit { .. } => "cache.hit",
            FetchEvent::CacheExpired { .. } => "cache.expired",
            FetchEvent::CacheSet { .. } => "cache.set",
            FetchEvent::QueueAdded { .. } => "queue.added",
            FetchEvent::BatchStart { .. } => "batch.start",
            FetchEvent::BatchSuccess { .. } => "batch.success",
            FetchEvent::BatchMissing { .. } => "batch.missing",
            FetchEvent::BatchError { .. } => "batch.error",
            FetchEvent::RetryAttempt { .. } => "retry.attempt",
        }
    }

    pub fn level(&self) -> EventLevel {
        match self {
            FetchEvent::CacheHit { .. } | FetchEvent::BatchStart { .. } => EventLevel::Info,
            FetchEvent::BatchMissing { .. } | FetchEvent::RetryAttempt { .. } => EventLevel::Warn,
            FetchEvent::BatchError { .. } => EventLevel::Error,
            _ => EventLevel::Debug,
        }
    }

    /// Event fields as a JSON object, without the event name.
    pub fn context(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("event");
                map
            }
            _ => serde_json::Map::new(),
        }
    }

    /// Lookup key this event concerns, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            FetchEvent::CacheHit { key }
            | FetchEvent::CacheExpired { key }
            | FetchEvent::CacheSet { key, .. }
            | FetchEvent::QueueAdded { key, .. }
            | FetchEvent::BatchMissing { key } => Some(key),
            _ => None,
        }
    }
}
