//! Provider seam: the caller-supplied resolution functions.

use crate::cache::KeyArg;
use crate::error::BoxError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Resolves a whole batch of keys in one call.
///
/// The returned map is keyed by the string form of each requested key. Keys the
/// provider leaves out are reported to their callers as missing.
#[async_trait]
pub trait BatchResolver<V>: Send + Sync {
    async fn resolve_batch(&self, keys: Vec<KeyArg>) -> Result<HashMap<String, V>, BoxError>;
}

/// Resolves one key at a time.
#[async_trait]
pub trait Resolver<V>: Send + Sync {
    async fn resolve(&self, key: KeyArg) -> Result<V, BoxError>;
}

/// A provider, either natively batching or single-item.
pub enum Provider<V> {
    Batched(Arc<dyn BatchResolver<V>>),
    Single(Arc<dyn Resolver<V>>),
}

impl<V> Clone for Provider<V> {
    fn clone(&self) -> Self {
        match self {
            Provider::Batched(r) => Provider::Batched(Arc::clone(r)),
            Provider::Single(r) => Provider::Single(Arc::clone(r)),
        }
    }
}

impl<V> std::fmt::Debug for Provider<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Batched(_) => f.write_str("Provider::Batched"),
            Provider::Single(_) => f.write_str("Provider::Single"),
        }
    }
}

impl<V: Send + 'static> Provider<V> {
    pub fn batched(resolver: impl BatchResolver<V> + 'static) -> Self {
        Provider::Batched(Arc::new(resolver))
    }

    pub fn single(resolver: impl Resolver<V> + 'static) -> Self {
        Provider::Single(Arc::new(resolver))
    }

    /// Batch provider from an async closure.
    pub fn batch_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<KeyArg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HashMap<String, V>, BoxError>> + Send + 'static,
    {
        Provider::batched(FnBatchResolver {
            f,
            _marker: PhantomData,
        })
    }

    /// Single-item provider from an async closure.
    pub fn single_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(KeyArg) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, BoxError>> + Send + 'static,
    {
        Provider::single(FnResolver {
            f,
            _marker: PhantomData,
        })
    }

    pub fn is_batchable(&self) -> bool {
        matches!(self, Provider::Batched(_))
    }

    /// Batch-shaped view of this provider; single-item providers go through the adapter.
    pub fn into_batch_resolver(self) -> Arc<dyn BatchResolver<V>> {
        match self {
            Provider::Batched(r) => r,
            Provider::Single(r) => Arc::new(super::adapter::SingleItemAdapter::new(r)),
        }
    }
}

struct FnBatchResolver<F, V> {
    f: F,
    _marker: PhantomData<fn() -> V>,
}

#[async_trait]
impl<F, Fut, V> BatchResolver<V> for FnBatchResolver<F, V>
where
    F: Fn(Vec<KeyArg>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HashMap<String, V>, BoxError>> + Send,
    V: Send,
{
    async fn resolve_batch(&self, keys: Vec<KeyArg>) -> Result<HashMap<String, V>, BoxError> {
        (self.f)(keys).await
    }
}

struct FnResolver<F, V> {
    f: F,
    _marker: PhantomData<fn() -> V>,
}

#[async_trait]
impl<F, Fut, V> Resolver<V> for FnResolver<F, V>
where
    F: Fn(KeyArg) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, BoxError>> + Send,
    V: Send,
{
    async fn resolve(&self, key: KeyArg) -> Result<V, BoxError> {
        (self.f)(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_fn_provider() {
        let provider: Provider<String> = Provider::batch_fn(|keys: Vec<KeyArg>| async move {
            Ok(keys
                .into_iter()
                .map(|k| (k.to_string(), format!("v{}", k)))
                .collect())
        });
        assert!(provider.is_batchable());

        let resolver = provider.into_batch_resolver();
        let out = resolver
            .resolve_batch(vec![KeyArg::Number(1), KeyArg::Text("x".into())])
            .await
            .unwrap();
        assert_eq!(out.get("1").map(String::as_str), Some("v1"));
        assert_eq!(out.get("x").map(String::as_str), Some("vx"));
    }

    #[tokio::test]
    async fn test_single_fn_provider_is_adapted() {
        let provider: Provider<u64> = Provider::single_fn(|k: KeyArg| async move {
            k.as_number().map(|n| n * 2).ok_or_else(|| "not a number".into())
        });
        assert!(!provider.is_batchable());

        let out = provider
            .into_batch_resolver()
            .resolve_batch(vec![KeyArg::Number(2), KeyArg::Number(5)])
            .await
            .unwrap();
        assert_eq!(out.get("2"), Some(&4));
        assert_eq!(out.get("5"), Some(&10));
    }
}
