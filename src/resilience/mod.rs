//! 弹性模式模块：为批量调用提供有界重试与指数退避。
//!
//! # Resilience Primitives Module
//!
//! Batch calls to the provider are wrapped in a [`RetryPolicy`]. Retries are
//! transparent to callers: only the final, exhausted failure is ever surfaced.
//!
//! ## Backoff
//!
//! The wait after the zero-indexed failed attempt `n` is `base_delay * 2^n`, with no
//! jitter and no cap. Waiting is a tokio sleep, so other tasks keep running.
//!
//! ```rust
//! use batched_fetcher::resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(2, Duration::from_millis(200));
//! assert_eq!(policy.max_attempts(), 3);
//! assert_eq!(policy.backoff(1), Duration::from_millis(400));
//! ```

mod retry;

pub use retry::{RetryError, RetryPolicy};
