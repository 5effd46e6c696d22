//! Batch adapter: lets a single-item provider run through the batch pipeline.

use super::provider::{BatchResolver, Resolver};
use crate::cache::KeyArg;
use crate::error::BoxError;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;

/// Fans a batch out to one `resolve` call per key, concurrently.
///
/// Results are collected under each argument's string form. Any single failure fails
/// the whole batch.
pub struct SingleItemAdapter<V> {
    inner: Arc<dyn Resolver<V>>,
}

impl<V> SingleItemAdapter<V> {
    pub fn new(inner: Arc<dyn Resolver<V>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<V: Send + 'static> BatchResolver<V> for SingleItemAdapter<V> {
    async fn resolve_batch(&self, keys: Vec<KeyArg>) -> Result<HashMap<String, V>, BoxError> {
        let calls = keys.into_iter().map(|key| {
            let inner = Arc::clone(&self.inner);
            async move {
                let name = key.to_string();
                let value = inner.resolve(key).await?;
                Ok::<_, BoxError>((name, value))
            }
        });
        let entries = try_join_all(calls).await?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Provider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Doubler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Resolver<u64> for Doubler {
        async fn resolve(&self, key: KeyArg) -> Result<u64, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match key {
                KeyArg::Number(n) => Ok(n * 2),
                KeyArg::Text(t) => Err(format!("cannot double {}", t).into()),
            }
        }
    }

    #[tokio::test]
    async fn test_one_call_per_key() {
        let doubler = Arc::new(Doubler {
            calls: AtomicUsize::new(0),
        });
        let adapter = SingleItemAdapter::new(doubler.clone() as Arc<dyn Resolver<u64>>);

        let out = adapter
            .resolve_batch(vec![KeyArg::Number(1), KeyArg::Number(2), KeyArg::Number(3)])
            .await
            .unwrap();

        assert_eq!(doubler.calls.load(Ordering::SeqCst), 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out["3"], 6);
    }

    #[tokio::test]
    async fn test_any_failure_fails_the_batch() {
        let adapter = SingleItemAdapter::new(Arc::new(Doubler {
            calls: AtomicUsize::new(0),
        }) as Arc<dyn Resolver<u64>>);

        let err = adapter
            .resolve_batch(vec![KeyArg::Number(1), KeyArg::Text("x".into())])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot double x");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider: Provider<u64> = Provider::single_fn(|_k: KeyArg| async { Ok(0) });
        let out = provider.into_batch_resolver().resolve_batch(vec![]).await.unwrap();
        assert!(out.is_empty());
    }
}
