//! Runtime signals (facts only) for one fetcher instance.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters accumulated over the life of a fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetcherStats {
    pub requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub batches: u64,
    pub provider_attempts: u64,
    pub retries: u64,
    pub missing_results: u64,
    pub batch_failures: u64,
}

impl FetcherStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Snapshot of a fetcher's queue, cache and timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherSignals {
    /// Distinct keys waiting for the next flush.
    pub pending_keys: usize,
    /// Requests waiting for the next flush, across all keys.
    pub pending_requests: usize,
    /// Stored cache entries, including expired ones not yet read.
    pub cached_entries: usize,
    pub timer_armed: bool,
    pub stats: FetcherStats,
}

#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    pub requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub batches: AtomicU64,
    pub provider_attempts: AtomicU64,
    pub retries: AtomicU64,
    pub missing_results: AtomicU64,
    pub batch_failures: AtomicU64,
}

impl AtomicStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn to_stats(&self) -> FetcherStats {
        FetcherStats {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            provider_attempts: self.provider_attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            missing_results: self.missing_results.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
        }
    }
}
