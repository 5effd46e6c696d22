//! 批量获取器模块：去抖合并请求、分发结果并缓存。
//!
//! # Fetcher Module
//!
//! A [`BatchedFetcher`] turns independent per-identifier requests into batched
//! provider calls:
//!
//! 1. `fetch(id)` maps the identifier to a key and checks the cache. Hits return
//!    immediately and never touch the queue.
//! 2. Misses are queued and the debounce timer is re-armed. Only a full quiet
//!    period of `debounce` flushes the queue, so a steady trickle of requests keeps
//!    postponing the flush.
//! 3. The flush drains the queue, calls the provider once with every key (retrying
//!    with exponential backoff), then resolves each caller, caches values when a TTL
//!    is set, and rejects callers whose key is missing from the result.
//!
//! Requests arriving while a flush is in flight start a new, independent window.
//!
//! ## Example
//!
//! ```rust,no_run
//! use batched_fetcher::batch::Provider;
//! use batched_fetcher::cache::KeyArg;
//! use batched_fetcher::fetcher::BatchedFetcher;
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> batched_fetcher::Result<()> {
//!     let provider = Provider::batch_fn(|keys: Vec<KeyArg>| async move {
//!         let out: HashMap<String, String> = keys
//!             .iter()
//!             .map(|k| (k.to_string(), format!("user #{}", k)))
//!             .collect();
//!         Ok(out)
//!     });
//!
//!     let users: BatchedFetcher<u64, String> = BatchedFetcher::builder(provider)
//!         .debounce(Duration::from_millis(20))
//!         .cache_ttl(Duration::from_secs(30))
//!         .build();
//!
//!     let (a, b) = tokio::join!(users.fetch(&1), users.fetch(&2));
//!     println!("{} / {}", a?, b?);
//!     Ok(())
//! }
//! ```

mod builder;
mod config;
mod core;
mod flush;
mod signals;

pub use builder::FetcherBuilder;
pub use config::{
    FetcherConfig, ENV_CACHE_TTL_MS, ENV_DEBOUNCE_MS, ENV_RETRIES, ENV_RETRY_DELAY_MS,
};
pub use self::core::BatchedFetcher;
pub use signals::{FetcherSignals, FetcherStats};
