//! # batched-fetcher
//!
//! 请求合并获取引擎：把短时间窗口内的独立请求合并为一次批量调用。
//!
//! Request-coalescing fetch engine. Independent callers ask for values one
//! identifier at a time; requests that arrive within a short debounce window are
//! grouped into a single batched provider call, results are cached for a
//! configurable time-to-live, failed batch calls are retried with exponential
//! backoff, and fetchers built with identical configuration share one
//! queue/cache/timer set through a [`FetcherRegistry`].
//!
//! ## Core Philosophy
//!
//! - **Provider-Agnostic**: the engine never performs transport itself; the batch
//!   (or single-item) resolver is supplied by the caller
//! - **Per-Cycle Failure**: a failed batch rejects only the callers of that batch;
//!   the fetcher keeps serving later windows
//! - **Observable**: every cache, queue, batch and retry step is emitted through
//!   `tracing` and an injectable [`telemetry::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use batched_fetcher::{BatchedFetcher, FetcherRegistry, KeyArg, Provider};
//! use std::collections::HashMap;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> batched_fetcher::Result<()> {
//!     let registry = FetcherRegistry::new();
//!
//!     let provider = Provider::batch_fn(|ids: Vec<KeyArg>| async move {
//!         // One upstream call for the whole window.
//!         let out: HashMap<String, String> = ids
//!             .iter()
//!             .map(|id| (id.to_string(), format!("product {}", id)))
//!             .collect();
//!         Ok(out)
//!     });
//!
//!     let products = registry.fetcher(
//!         "catalog.products",
//!         BatchedFetcher::<u64, String>::builder(provider).cache_ttl(Duration::from_secs(60)),
//!     )?;
//!
//!     let (a, b, c) = tokio::join!(products.fetch(&1), products.fetch(&2), products.fetch(&1));
//!     println!("{} {} {}", a?, b?, c?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`fetcher`] | Fetcher instances, configuration, debounce and flush cycle |
//! | [`registry`] | Signature-keyed sharing of fetcher instances |
//! | [`batch`] | Pending queue, provider seam and single-item adapter |
//! | [`cache`] | Key codec and TTL cache |
//! | [`resilience`] | Retry with exponential backoff |
//! | [`telemetry`] | Diagnostic events and sinks |

pub mod batch;
pub mod cache;
pub mod fetcher;
pub mod registry;
pub mod resilience;
pub mod telemetry;

// Re-export main types for convenience
pub use batch::{BatchResolver, Provider, Resolver};
pub use cache::{KeyArg, KeyCodec};
pub use fetcher::{BatchedFetcher, FetcherBuilder, FetcherConfig, FetcherSignals, FetcherStats};
pub use registry::{BatchSignature, FetcherRegistry};
pub use telemetry::{EventSink, FetchEvent};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{BoxError, Error, ErrorContext};
