//! 获取器注册表：按配置签名复用获取器实例。
//!
//! Fetcher registry that memoizes one fetcher instance per configuration
//! signature. Constructing a fetcher through the registry twice with identical
//! configuration returns handles to the same queue, cache and timer, so unrelated
//! call sites transparently share batches and cached values.
//!
//! The registry is owned by the application: create it once at startup and pass it
//! (it is a cheap `Clone` handle) to the call sites that build fetchers. Entries are
//! never removed.

mod signature;

pub use signature::BatchSignature;

use crate::error::ErrorContext;
use crate::fetcher::{BatchedFetcher, FetcherBuilder, FetcherConfig};
use crate::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type SignatureFn = Arc<dyn Fn(&str, bool, &FetcherConfig) -> BatchSignature + Send + Sync>;
type Instance = Arc<dyn Any + Send + Sync>;

/// Process-lifetime memo of fetcher instances keyed by [`BatchSignature`].
#[derive(Clone)]
pub struct FetcherRegistry {
    instances: Arc<RwLock<HashMap<BatchSignature, Instance>>>,
    signature_fn: SignatureFn,
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("instances", &self.len())
            .finish_non_exhaustive()
    }
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self {
            instances: Arc::new(RwLock::new(HashMap::new())),
            signature_fn: Arc::new(BatchSignature::derive),
        }
    }

    /// Replace how signatures are derived from `(provider_key, batchable, config)`.
    pub fn with_signature_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, bool, &FetcherConfig) -> BatchSignature + Send + Sync + 'static,
    {
        self.signature_fn = Arc::new(f);
        self
    }

    pub fn signature(&self, provider_key: &str, batchable: bool, config: &FetcherConfig) -> BatchSignature {
        (self.signature_fn)(provider_key, batchable, config)
    }

    /// Return the instance registered under `signature`, or build one with `factory`.
    ///
    /// Fails with a configuration error when the signature is already taken by a
    /// fetcher of different identifier or value types.
    pub fn get_or_create<I, V, F>(&self, signature: BatchSignature, factory: F) -> Result<BatchedFetcher<I, V>>
    where
        I: ?Sized + 'static,
        V: Clone + Send + 'static,
        F: FnOnce() -> BatchedFetcher<I, V>,
    {
        {
            let instances = self.instances.read().unwrap_or_else(|e| e.into_inner());
            if let Some(existing) = instances.get(&signature) {
                return Self::downcast(&signature, existing);
            }
        }

        let mut instances = self.instances.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have created it between the two locks.
        if let Some(existing) = instances.get(&signature) {
            return Self::downcast(&signature, existing);
        }
        let fetcher = factory();
        tracing::debug!(target: "batched_fetcher", signature = %signature, "registered fetcher instance");
        instances.insert(signature, Arc::new(fetcher.clone()));
        Ok(fetcher)
    }

    /// Derive the signature for `builder` and return the shared instance for it.
    ///
    /// `provider_key` is the caller's stable name for the provider; it stands in for
    /// the provider's identity, which closures cannot express.
    pub fn fetcher<I, V>(&self, provider_key: &str, builder: FetcherBuilder<I, V>) -> Result<BatchedFetcher<I, V>>
    where
        I: ?Sized + 'static,
        V: Clone + Send + 'static,
    {
        let signature = self.signature(provider_key, builder.is_batchable(), builder.config_ref());
        self.get_or_create(signature, move || builder.build())
    }

    pub fn contains(&self, signature: &BatchSignature) -> bool {
        self.instances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.instances.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn downcast<I, V>(signature: &BatchSignature, instance: &Instance) -> Result<BatchedFetcher<I, V>>
    where
        I: ?Sized + 'static,
        V: Clone + Send + 'static,
    {
        instance
            .downcast_ref::<BatchedFetcher<I, V>>()
            .cloned()
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "fetcher signature already registered with different identifier or value types",
                    ErrorContext::new()
                        .with_field_path(signature.as_str())
                        .with_source("registry"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Provider;
    use crate::cache::KeyArg;
    use std::collections::HashMap;
    use std::time::Duration;

    fn echo() -> Provider<String> {
        Provider::batch_fn(|keys: Vec<KeyArg>| async move {
            Ok(keys
                .into_iter()
                .map(|k| (k.to_string(), k.to_string()))
                .collect::<HashMap<_, _>>())
        })
    }

    #[tokio::test]
    async fn test_identical_config_shares_instance() {
        let registry = FetcherRegistry::new();
        let a = registry
            .fetcher("echo", BatchedFetcher::<u32, String>::builder(echo()))
            .unwrap();
        let b = registry
            .fetcher("echo", BatchedFetcher::<u32, String>::builder(echo()))
            .unwrap();
        assert!(a.shares_state_with(&b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_different_config_gets_new_instance() {
        let registry = FetcherRegistry::new();
        let a = registry
            .fetcher("echo", BatchedFetcher::<u32, String>::builder(echo()))
            .unwrap();
        let b = registry
            .fetcher(
                "echo",
                BatchedFetcher::<u32, String>::builder(echo()).debounce(Duration::from_millis(5)),
            )
            .unwrap();
        assert!(!a.shares_state_with(&b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_factory_runs_once() {
        let registry = FetcherRegistry::new();
        let sig = BatchSignature::new("fixed");
        let mut built = 0;
        for _ in 0..3 {
            registry
                .get_or_create(sig.clone(), || {
                    built += 1;
                    BatchedFetcher::<u32, String>::builder(echo()).build()
                })
                .unwrap();
        }
        assert_eq!(built, 1);
        assert!(registry.contains(&sig));
    }

    #[test]
    fn test_type_mismatch_is_configuration_error() {
        let registry = FetcherRegistry::new();
        let sig = BatchSignature::new("fixed");
        registry
            .get_or_create(sig.clone(), || BatchedFetcher::<u32, String>::builder(echo()).build())
            .unwrap();
        let err = registry
            .get_or_create(sig, || BatchedFetcher::<str, String>::builder(echo()).build())
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_custom_signature_fn() {
        // Ignore timing options entirely: one instance per provider key.
        let registry = FetcherRegistry::new()
            .with_signature_fn(|key, _, _| BatchSignature::new(format!("by-key:{}", key)));
        let a = registry
            .fetcher("echo", BatchedFetcher::<u32, String>::builder(echo()))
            .unwrap();
        let b = registry
            .fetcher(
                "echo",
                BatchedFetcher::<u32, String>::builder(echo()).retries(9),
            )
            .unwrap();
        assert!(a.shares_state_with(&b));
        assert!(registry.contains(&BatchSignature::new("by-key:echo")));
    }
}
