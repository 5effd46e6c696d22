//! Pending queue.
//!
//! Holds one ordered list of settlement handles per key until the next flush drains it.

use crate::Result;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Completion handle for one `fetch` call. Settled exactly once.
#[derive(Debug)]
pub struct Settlement<V> {
    tx: oneshot::Sender<Result<V>>,
}

impl<V> Settlement<V> {
    /// Create a handle and the receiver its caller awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Result<V>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn resolve(self, value: V) {
        // The caller may have dropped its future; nothing to deliver then.
        let _ = self.tx.send(Ok(value));
    }

    pub fn reject(self, err: crate::Error) {
        let _ = self.tx.send(Err(err));
    }

    pub fn settle(self, outcome: Result<V>) {
        let _ = self.tx.send(outcome);
    }
}

/// All outstanding handles for one key.
#[derive(Debug)]
pub struct PendingEntry<V> {
    pub key: String,
    pub handles: Vec<Settlement<V>>,
}

/// Snapshot of the queue taken at flush time. Keys keep their first-request order.
#[derive(Debug)]
pub struct FlushBatch<V> {
    entries: Vec<PendingEntry<V>>,
}

impl<V> FlushBatch<V> {
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of settlement handles across all keys.
    pub fn request_count(&self) -> usize {
        self.entries.iter().map(|e| e.handles.len()).sum()
    }

    pub fn into_entries(self) -> Vec<PendingEntry<V>> {
        self.entries
    }

    /// Reject every handle in the batch with the same error.
    pub fn reject_all(self, err: &crate::Error) {
        for entry in self.entries {
            for handle in entry.handles {
                handle.reject(err.clone());
            }
        }
    }
}

/// Live queue of requests awaiting the next flush.
#[derive(Debug)]
pub struct PendingQueue<V> {
    entries: Vec<PendingEntry<V>>,
    index: HashMap<String, usize>,
}

impl<V> Default for PendingQueue<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> PendingQueue<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a caller for `key`. Returns how many callers now wait on that key.
    pub fn enqueue(&mut self, key: impl Into<String>, handle: Settlement<V>) -> usize {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            let entry = &mut self.entries[i];
            entry.handles.push(handle);
            return entry.handles.len();
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(PendingEntry {
            key,
            handles: vec![handle],
        });
        1
    }

    /// Take everything queued so far and leave the queue empty.
    pub fn drain_all(&mut self) -> FlushBatch<V> {
        self.index.clear();
        FlushBatch {
            entries: std::mem::take(&mut self.entries),
        }
    }

    /// Number of distinct keys waiting.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of waiting requests across all keys.
    pub fn request_count(&self) -> usize {
        self.entries.iter().map(|e| e.handles.len()).sum()
    }
}
