//! 请求批处理模块：挂起队列、提供方接口与单项适配器。
//!
//! # Request Batching Module
//!
//! Requests that miss the cache wait here until the next flush hands their keys to
//! the provider in one call.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PendingQueue`] | Per-key lists of callers awaiting the next flush |
//! | [`FlushBatch`] | Snapshot drained from the queue at flush time |
//! | [`Settlement`] | One caller's completion handle |
//! | [`Provider`] | Caller-supplied resolver, batched or single-item |
//! | [`SingleItemAdapter`] | Runs a single-item resolver as a batch resolver |
//!
//! ## Example
//!
//! ```rust
//! use batched_fetcher::batch::{PendingQueue, Settlement};
//!
//! let mut queue: PendingQueue<String> = PendingQueue::new();
//! let (handle, _rx) = Settlement::channel();
//! queue.enqueue("42", handle);
//!
//! let batch = queue.drain_all();
//! assert_eq!(batch.keys(), vec!["42"]);
//! assert!(queue.is_empty());
//! ```

mod adapter;
mod provider;
mod queue;

pub use adapter::SingleItemAdapter;
pub use provider::{BatchResolver, Provider, Resolver};
pub use queue::{FlushBatch, PendingEntry, PendingQueue, Settlement};
