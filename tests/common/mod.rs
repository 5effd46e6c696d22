//! Shared test providers and helpers.
#![allow(dead_code)]

use batched_fetcher::{BoxError, KeyArg, Provider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One provider invocation as seen by the provider.
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub keys: Vec<KeyArg>,
}

#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a call and return its zero-based index.
    pub fn record(&self, keys: Vec<KeyArg>) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            at: Instant::now(),
            keys,
        });
        calls.len() - 1
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn value_for(key: &KeyArg) -> String {
    format!("value-{}", key)
}

/// Resolves every requested key to `value-<key>`.
pub fn echo_provider(log: Arc<CallLog>) -> Provider<String> {
    Provider::batch_fn(move |keys: Vec<KeyArg>| {
        let log = log.clone();
        async move {
            log.record(keys.clone());
            Ok(keys
                .iter()
                .map(|k| (k.to_string(), value_for(k)))
                .collect::<HashMap<_, _>>())
        }
    })
}

/// Like [`echo_provider`] but leaves out the listed keys.
pub fn partial_provider(log: Arc<CallLog>, omit: &'static [&'static str]) -> Provider<String> {
    Provider::batch_fn(move |keys: Vec<KeyArg>| {
        let log = log.clone();
        async move {
            log.record(keys.clone());
            Ok(keys
                .iter()
                .filter(|k| !omit.contains(&k.to_string().as_str()))
                .map(|k| (k.to_string(), value_for(k)))
                .collect::<HashMap<_, _>>())
        }
    })
}

/// Fails every call with `boom #<call number>`.
pub fn failing_provider(log: Arc<CallLog>) -> Provider<String> {
    Provider::batch_fn(move |keys: Vec<KeyArg>| {
        let log = log.clone();
        async move {
            let n = log.record(keys) + 1;
            Err::<HashMap<String, String>, BoxError>(format!("boom #{}", n).into())
        }
    })
}

/// Echo provider whose first call takes `first_delay` to answer.
pub fn slow_first_provider(log: Arc<CallLog>, first_delay: Duration) -> Provider<String> {
    Provider::batch_fn(move |keys: Vec<KeyArg>| {
        let log = log.clone();
        async move {
            if log.record(keys.clone()) == 0 {
                tokio::time::sleep(first_delay).await;
            }
            Ok(keys
                .iter()
                .map(|k| (k.to_string(), value_for(k)))
                .collect::<HashMap<_, _>>())
        }
    })
}
