//! Flush controller: one batch cycle from drained queue to settled callers.
//!
//! Cycles of the same fetcher are independent and may overlap; a slow provider
//! call (or its retries) never holds back the next window.

use crate::batch::{FlushBatch, Settlement};
use crate::cache::{parse_key, KeyArg};
use crate::fetcher::core::Shared;
use crate::fetcher::signals::AtomicStats;
use crate::resilience::RetryError;
use crate::telemetry::FetchEvent;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) async fn run<V>(shared: Arc<Shared<V>>, batch: FlushBatch<V>)
where
    V: Clone + Send + 'static,
{
    let keys = batch.keys();
    let args: Vec<KeyArg> = keys.iter().map(|k| parse_key(k)).collect();
    AtomicStats::incr(&shared.stats.batches);
    shared.emit(FetchEvent::BatchStart { keys });

    let resolver = Arc::clone(&shared.resolver);
    let outcome = shared
        .config
        .retry_policy()
        .run(
            || {
                AtomicStats::incr(&shared.stats.provider_attempts);
                resolver.resolve_batch(args.clone())
            },
            |attempt, delay, err| {
                AtomicStats::incr(&shared.stats.retries);
                shared.emit(FetchEvent::RetryAttempt {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                    error: err.to_string(),
                });
            },
        )
        .await;

    match outcome {
        Ok(results) => {
            shared.emit(FetchEvent::BatchSuccess {
                requested: batch.len(),
                returned: results.len(),
            });
            distribute(&shared, batch, results);
        }
        Err(RetryError { attempts, last }) => {
            let err = Error::provider(attempts, last);
            AtomicStats::incr(&shared.stats.batch_failures);
            shared.emit(FetchEvent::BatchError {
                error: err.to_string(),
                attempts,
            });
            batch.reject_all(&err);
        }
    }
}

/// Settle every handle of the batch from a successful provider result.
///
/// Keys present in `results` resolve (and are cached when caching is on); keys
/// missing from it reject with [`Error::MissingResult`].
fn distribute<V>(shared: &Shared<V>, batch: FlushBatch<V>, mut results: HashMap<String, V>)
where
    V: Clone + Send + 'static,
{
    let ttl = shared.config.cache_ttl;
    let mut events = Vec::new();
    let mut outcomes: Vec<(Vec<Settlement<V>>, Result<V>)> = Vec::with_capacity(batch.len());
    let mut to_cache = Vec::new();

    for entry in batch.into_entries() {
        match results.remove(&entry.key) {
            Some(value) => {
                if shared.config.caching_enabled() {
                    to_cache.push((entry.key, value.clone()));
                }
                outcomes.push((entry.handles, Ok(value)));
            }
            None => {
                AtomicStats::incr(&shared.stats.missing_results);
                events.push(FetchEvent::BatchMissing {
                    key: entry.key.clone(),
                });
                outcomes.push((entry.handles, Err(Error::missing_result(entry.key))));
            }
        }
    }

    if !to_cache.is_empty() {
        let mut state = shared.lock_state();
        for (key, value) in to_cache {
            events.push(FetchEvent::CacheSet {
                key: key.clone(),
                ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            });
            state.cache.set(key, value, ttl);
        }
    }

    for event in events {
        shared.emit(event);
    }
    for (handles, outcome) in outcomes {
        for handle in handles {
            handle.settle(outcome.clone());
        }
    }
}
