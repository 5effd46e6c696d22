//! 遥测模块：结构化诊断事件与可插拔事件接收器。
//!
//! Telemetry Module.
//!
//! Every state change of a fetcher (cache hit/expiry/store, enqueue, batch start and
//! outcome, retries) is emitted twice: as a `tracing` event under the
//! `batched_fetcher` target, and as a typed [`FetchEvent`] handed to the fetcher's
//! [`EventSink`]. Sinks are observers only; they cannot fail and never influence how
//! a request settles.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FetchEvent`] | Typed diagnostic event enum |
//! | [`EventSink`] | Trait for event destinations |
//! | [`NoopEventSink`] | Default no-op sink |
//! | [`InMemoryEventSink`] | Bounded in-memory sink for testing |
//! | [`CompositeEventSink`] | Multi-destination composite sink |

mod event;

pub use event::{EventLevel, FetchEvent};

use std::sync::{Arc, RwLock};

/// Event sink trait.
///
/// Called synchronously from the fetch path, so implementations should return quickly.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &FetchEvent);
}

/// No-op sink (default).
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _: &FetchEvent) {}
}

/// Returns a no-op event sink.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoopEventSink)
}

/// In-memory sink for testing.
pub struct InMemoryEventSink {
    events: RwLock<Vec<FetchEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max,
        }
    }
    pub fn get_events(&self) -> Vec<FetchEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
    /// Events with the given dotted name, e.g. `"retry.attempt"`.
    pub fn get_events_by_name(&self, name: &str) -> Vec<FetchEvent> {
        self.events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.name() == name)
            .cloned()
            .collect()
    }
    pub fn count(&self, name: &str) -> usize {
        self.get_events_by_name(name).len()
    }
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
    pub fn len(&self) -> usize {
        self.events.read().unwrap_or_else(|e| e.into_inner()).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: &FetchEvent) {
        let mut events = self.events.write().unwrap_or_else(|e| e.into_inner());
        events.push(event.clone());
        if events.len() > self.max_events {
            events.remove(0);
        }
    }
}

/// Composite sink for multiple destinations.
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn add_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for CompositeEventSink {
    fn record(&self, event: &FetchEvent) {
        for s in &self.sinks {
            s.record(event);
        }
    }
}

impl<F> EventSink for F
where
    F: Fn(&FetchEvent) + Send + Sync,
{
    fn record(&self, event: &FetchEvent) {
        self(event)
    }
}

/// Log `event` through `tracing` and hand it to `sink`.
pub(crate) fn emit(sink: &dyn EventSink, event: FetchEvent) {
    let name = event.name();
    match event.level() {
        EventLevel::Debug => {
            tracing::debug!(target: "batched_fetcher", event = name, context = ?event.context())
        }
        EventLevel::Info => {
            tracing::info!(target: "batched_fetcher", event = name, context = ?event.context())
        }
        EventLevel::Warn => {
            tracing::warn!(target: "batched_fetcher", event = name, context = ?event.context())
        }
        EventLevel::Error => {
            tracing::error!(target: "batched_fetcher", event = name, context = ?event.context())
        }
    }
    sink.record(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_in_memory_sink_is_bounded() {
        let sink = InMemoryEventSink::new(2);
        for key in ["a", "b", "c"] {
            sink.record(&FetchEvent::CacheHit { key: key.into() });
        }
        let events = sink.get_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].key(), Some("b"));
    }

    #[test]
    fn test_composite_fans_out() {
        let a = Arc::new(InMemoryEventSink::default());
        let b = Arc::new(InMemoryEventSink::default());
        let composite = CompositeEventSink::new()
            .add_sink(a.clone())
            .add_sink(b.clone());

        emit(&composite, FetchEvent::BatchMissing { key: "9".into() });
        assert_eq!(a.count("batch.missing"), 1);
        assert_eq!(b.count("batch.missing"), 1);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let sink = move |_: &FetchEvent| {
            s.fetch_add(1, Ordering::SeqCst);
        };
        emit(&sink, FetchEvent::CacheExpired { key: "k".into() });
        emit(&NoopEventSink, FetchEvent::CacheExpired { key: "k".into() });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
