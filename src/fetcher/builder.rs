use crate::batch::Provider;
use crate::cache::KeyCodec;
use crate::fetcher::config::FetcherConfig;
use crate::fetcher::core::{BatchedFetcher, Shared};
use crate::telemetry::EventSink;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating fetchers with custom configuration.
pub struct FetcherBuilder<I: ?Sized, V> {
    provider: Provider<V>,
    config: FetcherConfig,
    codec: KeyCodec<I>,
    sink: Arc<dyn EventSink>,
}

impl<I, V> FetcherBuilder<I, V>
where
    I: fmt::Display + ?Sized + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(provider: Provider<V>) -> Self {
        Self::with_codec(provider, KeyCodec::display())
    }
}

impl<I, V> FetcherBuilder<I, V>
where
    I: ?Sized,
    V: Clone + Send + 'static,
{
    /// Builder for identifiers without a usable `Display` form.
    pub fn with_codec(provider: Provider<V>, codec: KeyCodec<I>) -> Self {
        Self {
            provider,
            config: FetcherConfig::default(),
            codec,
            sink: crate::telemetry::noop_sink(),
        }
    }

    /// Replace the whole timing/retry configuration.
    pub fn config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn debounce(mut self, d: Duration) -> Self {
        self.config.debounce = d;
        self
    }

    /// Cache lifetime of resolved values; zero disables caching.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.config.retries = n;
        self
    }

    pub fn retry_delay(mut self, d: Duration) -> Self {
        self.config.retry_delay = d;
        self
    }

    /// Map identifiers to keys with `f`.
    pub fn id_to_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&I) -> String + Send + Sync + 'static,
    {
        self.codec = KeyCodec::new(f);
        self
    }

    /// Inject an event sink. Default is a no-op sink.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config_ref(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn is_batchable(&self) -> bool {
        self.provider.is_batchable()
    }

    pub fn build(self) -> BatchedFetcher<I, V> {
        BatchedFetcher {
            shared: Arc::new(Shared::new(self.config, self.provider, self.sink)),
            codec: self.codec,
        }
    }
}
