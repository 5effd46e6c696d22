use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by provider callables.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared, cloneable provider error. One provider failure is fanned out to every
/// settlement handle of its batch, so it has to be shareable.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Configuration key or lookup key that caused the error (e.g., "debounce_time_ms", "user:42")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "registry", "flush")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the fetch engine.
///
/// Failures are always local to one flush cycle: they settle the affected callers
/// and never poison the fetcher for later cycles.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A key was requested in a batch but the provider's (otherwise successful)
    /// result did not contain it. Only callers of that key observe this.
    #[error("No result for key: {key}")]
    MissingResult { key: String },

    /// The provider failed on every attempt. Carries the last observed error.
    #[error("Provider failed after {attempts} attempt(s): {source}")]
    Provider {
        attempts: u32,
        #[source]
        source: SharedError,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub(crate) fn missing_result(key: impl Into<String>) -> Self {
        Error::MissingResult { key: key.into() }
    }

    pub(crate) fn provider(attempts: u32, source: BoxError) -> Self {
        Error::Provider {
            attempts,
            source: Arc::from(source),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_missing_result(&self) -> bool {
        matches!(self, Error::MissingResult { .. })
    }

    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Error::Provider { .. })
    }

    /// The last provider error, if this is a provider failure.
    pub fn provider_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Provider { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
