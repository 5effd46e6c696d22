use crate::batch::{BatchResolver, FlushBatch, PendingQueue, Provider, Settlement};
use crate::cache::{CacheLookup, KeyCodec, TtlCache};
use crate::error::ErrorContext;
use crate::fetcher::builder::FetcherBuilder;
use crate::fetcher::config::FetcherConfig;
use crate::fetcher::flush;
use crate::fetcher::signals::{AtomicStats, FetcherSignals, FetcherStats};
use crate::telemetry::{self, EventSink, FetchEvent};
use crate::{Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Stand-in deadline for debounce periods too large to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Mutable state of one fetcher. Only touched under the lock, never across an await.
pub(crate) struct State<V> {
    pub queue: PendingQueue<V>,
    pub cache: TtlCache<V>,
    /// Armed debounce timer, if any.
    pub timer: Option<JoinHandle<()>>,
    /// Bumped on every arm; a timer that wakes with an older value does nothing.
    pub generation: u64,
}

/// State shared by every clone of a fetcher.
pub(crate) struct Shared<V> {
    pub config: FetcherConfig,
    pub resolver: Arc<dyn BatchResolver<V>>,
    pub batchable: bool,
    pub sink: Arc<dyn EventSink>,
    pub stats: AtomicStats,
    state: Mutex<State<V>>,
}

enum Admission<V> {
    Ready(V),
    Queued(oneshot::Receiver<Result<V>>),
}

impl<V: Clone + Send + 'static> Shared<V> {
    pub fn new(config: FetcherConfig, provider: Provider<V>, sink: Arc<dyn EventSink>) -> Self {
        let batchable = provider.is_batchable();
        Self {
            config,
            resolver: provider.into_batch_resolver(),
            batchable,
            sink,
            stats: AtomicStats::default(),
            state: Mutex::new(State {
                queue: PendingQueue::new(),
                cache: TtlCache::new(),
                timer: None,
                generation: 0,
            }),
        }
    }

    pub fn lock_state(&self) -> MutexGuard<'_, State<V>> {
        // Nothing panics while holding the lock, but never let poisoning wedge a fetcher.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn emit(&self, event: FetchEvent) {
        telemetry::emit(self.sink.as_ref(), event);
    }

    /// Serve from cache, or queue the request and (re)arm the debounce timer.
    fn admit(self: &Arc<Self>, key: String) -> Result<Admission<V>> {
        AtomicStats::incr(&self.stats.requests);
        let mut events = Vec::with_capacity(2);

        let admission = {
            let mut state = self.lock_state();
            let mut cached = None;
            if self.config.caching_enabled() {
                match state.cache.lookup(&key) {
                    CacheLookup::Hit(v) => cached = Some(v),
                    CacheLookup::Expired => {
                        events.push(FetchEvent::CacheExpired { key: key.clone() })
                    }
                    CacheLookup::Miss => {}
                }
            }

            match cached {
                Some(v) => {
                    AtomicStats::incr(&self.stats.cache_hits);
                    events.push(FetchEvent::CacheHit { key });
                    Ok(Admission::Ready(v))
                }
                None => {
                    if self.config.caching_enabled() {
                        AtomicStats::incr(&self.stats.cache_misses);
                    }
                    self.enqueue(&mut state, key, &mut events)
                }
            }
        };

        for event in events {
            self.emit(event);
        }
        admission
    }

    fn enqueue(
        self: &Arc<Self>,
        state: &mut State<V>,
        key: String,
        events: &mut Vec<FetchEvent>,
    ) -> Result<Admission<V>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::runtime_with_context(
                "fetch requires a tokio runtime",
                ErrorContext::new()
                    .with_field_path(key.as_str())
                    .with_details(e.to_string())
                    .with_source("fetcher"),
            )
        })?;

        let (handle, rx) = Settlement::channel();
        let waiters = state.queue.enqueue(key.clone(), handle);
        events.push(FetchEvent::QueueAdded { key, waiters });
        self.arm_timer(state, &runtime);
        Ok(Admission::Queued(rx))
    }

    /// Cancel any armed timer and start a fresh single-shot one.
    fn arm_timer(self: &Arc<Self>, state: &mut State<V>, runtime: &tokio::runtime::Handle) {
        if let Some(prev) = state.timer.take() {
            prev.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        // Deadline counts from the arming request, not from the task's first poll.
        let now = tokio::time::Instant::now();
        let deadline = now
            .checked_add(self.config.debounce)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let shared = Arc::clone(self);
        state.timer = Some(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(batch) = shared.take_batch(generation) {
                flush::run(shared, batch).await;
            }
        }));
    }

    /// Drain the queue if the timer that fired is still the current one.
    ///
    /// Once this returns a batch the timer handle is gone from the state, so nothing
    /// can abort the flush that follows.
    fn take_batch(&self, generation: u64) -> Option<FlushBatch<V>> {
        let mut state = self.lock_state();
        if state.generation != generation {
            return None;
        }
        state.timer = None;
        let batch = state.queue.drain_all();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Caller-facing handle of a fetcher instance.
///
/// Clones share one queue, cache and timer. Requests for the same key made within one
/// debounce window share a single provider resolution.
pub struct BatchedFetcher<I: ?Sized, V> {
    pub(crate) shared: Arc<Shared<V>>,
    pub(crate) codec: KeyCodec<I>,
}

impl<I: ?Sized, V> Clone for BatchedFetcher<I, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            codec: self.codec.clone(),
        }
    }
}

impl<I: ?Sized, V> fmt::Debug for BatchedFetcher<I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchedFetcher")
            .field("config", &self.shared.config)
            .field("batchable", &self.shared.batchable)
            .finish_non_exhaustive()
    }
}

impl<I, V> BatchedFetcher<I, V>
where
    I: fmt::Display + ?Sized + 'static,
    V: Clone + Send + 'static,
{
    /// Start building a fetcher whose keys are the identifiers' `Display` form.
    pub fn builder(provider: Provider<V>) -> FetcherBuilder<I, V> {
        FetcherBuilder::new(provider)
    }
}

impl<I, V> BatchedFetcher<I, V>
where
    I: ?Sized,
    V: Clone + Send + 'static,
{
    /// Start building a fetcher whose keys come from `id_to_key`.
    pub fn builder_with_codec<F>(provider: Provider<V>, id_to_key: F) -> FetcherBuilder<I, V>
    where
        F: Fn(&I) -> String + Send + Sync + 'static,
    {
        FetcherBuilder::with_codec(provider, KeyCodec::new(id_to_key))
    }

    /// Request the value for `id`.
    ///
    /// The request is admitted when this is called, not when the future is first
    /// polled: a cache hit is captured immediately, and a miss joins the current
    /// batch window right away. Must be called from within a tokio runtime unless
    /// the value is cached.
    pub fn fetch(&self, id: &I) -> impl Future<Output = Result<V>> + Send + 'static {
        let key = self.codec.to_key(id);
        let admission = self.shared.admit(key.clone());
        async move {
            match admission? {
                Admission::Ready(v) => Ok(v),
                Admission::Queued(rx) => rx.await.unwrap_or_else(|_| {
                    Err(Error::runtime_with_context(
                        "request dropped before its batch settled",
                        ErrorContext::new()
                            .with_field_path(key)
                            .with_source("fetcher"),
                    ))
                }),
            }
        }
    }

    /// Fetch several identifiers; they join the same batch window.
    pub async fn fetch_all<'a, It>(&self, ids: It) -> Vec<Result<V>>
    where
        It: IntoIterator<Item = &'a I>,
        I: 'a,
    {
        let pending: Vec<_> = ids.into_iter().map(|id| self.fetch(id)).collect();
        futures::future::join_all(pending).await
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.shared.config
    }

    pub fn is_batchable(&self) -> bool {
        self.shared.batchable
    }

    /// Whether `other` is a handle to the same instance (same queue, cache and timer).
    pub fn shares_state_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn stats(&self) -> FetcherStats {
        self.shared.stats.to_stats()
    }

    /// Snapshot current runtime signals (facts only).
    pub fn signals(&self) -> FetcherSignals {
        let state = self.shared.lock_state();
        FetcherSignals {
            pending_keys: state.queue.len(),
            pending_requests: state.queue.request_count(),
            cached_entries: state.cache.len(),
            timer_armed: state.timer.is_some(),
            stats: self.shared.stats.to_stats(),
        }
    }

    /// Drop every cached value. Pending requests are unaffected.
    pub fn clear_cache(&self) {
        self.shared.lock_state().cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyArg;
    use std::collections::HashMap;

    fn fetcher() -> BatchedFetcher<u32, u32> {
        let provider = Provider::batch_fn(|keys: Vec<KeyArg>| async move {
            Ok(keys
                .iter()
                .filter_map(|k| k.as_number().map(|n| (k.to_string(), n as u32)))
                .collect::<HashMap<_, _>>())
        });
        BatchedFetcher::builder(provider).build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_generation_is_ignored() {
        let f = fetcher();
        let pending = f.fetch(&1);
        let current = f.shared.lock_state().generation;

        assert!(f.shared.take_batch(current.wrapping_sub(1)).is_none());
        assert_eq!(f.signals().pending_requests, 1);

        assert_eq!(pending.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_timer() {
        let f = fetcher();
        let _a = f.fetch(&1);
        let first = f.shared.lock_state().generation;
        let _b = f.fetch(&2);
        let second = f.shared.lock_state().generation;

        assert_eq!(second, first + 1);
        assert!(f.signals().timer_armed);

        let batch = f.shared.take_batch(second).unwrap();
        assert_eq!(batch.keys(), vec!["1", "2"]);
        assert!(!f.signals().timer_armed);
    }

    #[test]
    fn test_clones_share_state() {
        let f = fetcher();
        let g = f.clone();
        assert!(f.shares_state_with(&g));
        assert!(!f.shares_state_with(&fetcher()));
    }
}
