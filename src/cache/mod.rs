//! 缓存模块：键编解码与带过期时间的结果缓存。
//!
//! # Key Codec and TTL Cache
//!
//! Fetch results are cached per key so repeated lookups within the configured
//! lifetime skip the batching machinery entirely.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`KeyCodec`] | Maps caller identifiers to string keys |
//! | [`KeyArg`] | Key in the shape handed to the provider (number or text) |
//! | [`parse_key`] | Key -> [`KeyArg`] conversion |
//! | [`TtlCache`] | Key -> value store with lazy expiration |
//!
//! ## Example
//!
//! ```rust
//! use batched_fetcher::cache::{parse_key, KeyArg, KeyCodec};
//!
//! let codec: KeyCodec<u32> = KeyCodec::display();
//! let key = codec.to_key(&42);
//! assert_eq!(parse_key(&key), KeyArg::Number(42));
//! ```

mod key;
mod ttl;

pub use key::{parse_key, KeyArg, KeyCodec};
pub use ttl::{CacheLookup, TtlCache};
