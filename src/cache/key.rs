//! Key codec: identifier -> string key, and key -> provider argument.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

static NUMERIC_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("static regex"));

/// A key as handed to the provider.
///
/// Keys made solely of digits are passed as numbers, everything else verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyArg {
    Number(u64),
    Text(String),
}

impl KeyArg {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            KeyArg::Number(n) => Some(*n),
            KeyArg::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KeyArg::Text(s) => Some(s),
            KeyArg::Number(_) => None,
        }
    }
}

impl fmt::Display for KeyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyArg::Number(n) => write!(f, "{}", n),
            KeyArg::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for KeyArg {
    fn from(n: u64) -> Self {
        KeyArg::Number(n)
    }
}

impl From<&str> for KeyArg {
    fn from(s: &str) -> Self {
        KeyArg::Text(s.to_string())
    }
}

/// Convert a batch key back into the provider's argument shape.
///
/// Digit-only keys that overflow `u64` stay text.
pub fn parse_key(key: &str) -> KeyArg {
    if NUMERIC_KEY.is_match(key) {
        if let Ok(n) = key.parse::<u64>() {
            return KeyArg::Number(n);
        }
    }
    KeyArg::Text(key.to_string())
}

type KeyFn<I> = Arc<dyn Fn(&I) -> String + Send + Sync>;

/// Maps caller identifiers to cache/queue keys.
///
/// Must be deterministic; two identifiers producing the same key are treated as one.
pub struct KeyCodec<I: ?Sized> {
    to_key: KeyFn<I>,
}

impl<I: ?Sized> Clone for KeyCodec<I> {
    fn clone(&self) -> Self {
        Self {
            to_key: Arc::clone(&self.to_key),
        }
    }
}

impl<I: ?Sized> KeyCodec<I> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&I) -> String + Send + Sync + 'static,
    {
        Self { to_key: Arc::new(f) }
    }

    pub fn to_key(&self, id: &I) -> String {
        (self.to_key)(id)
    }
}

impl<I: fmt::Display + ?Sized + 'static> KeyCodec<I> {
    /// Default codec: the identifier's `Display` form.
    pub fn display() -> Self {
        Self::new(|id: &I| id.to_string())
    }
}

impl<I: ?Sized> fmt::Debug for KeyCodec<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCodec").finish_non_exhaustive()
    }
}
