use crate::config::ConfigError;
use crate::provider::{ProviderError, ProviderErrorKind};
use std::fmt;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path that caused the error (e.g., "request.temperature")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "request_validator")
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

/// Why a run stopped before reaching a terminal success or exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The caller's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled by caller"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Diagnostic summary of one link that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub model_name: String,
    pub provider_label: String,
    /// Calls made on this link before it gave up.
    pub attempts: u32,
    pub error_kind: ProviderErrorKind,
    pub message: String,
}

/// Unified error type for the router.
///
/// Only four things ever reach a caller: a configuration mistake, an invalid
/// request, a cancellation, or an exhausted chain. Individual provider
/// failures are absorbed and only surface wrapped in [`Error::ChainExhausted`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Request {0}")]
    Cancelled(CancelReason),

    #[error("All {} link(s) failed; last error: {last}", .attempted.len())]
    ChainExhausted {
        /// Error from the final link tried.
        last: Box<ProviderError>,
        attempted: Vec<AttemptRecord>,
    },

    #[cfg(feature = "http")]
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
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
    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    /// The last link's provider error, for exhausted chains.
    pub fn last_provider_error(&self) -> Option<&ProviderError> {
        match self {
            Error::ChainExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_includes_context() {
        let err = Error::validation_with_context(
            "temperature must be within [0, 2]",
            ErrorContext::new()
                .with_field_path("request.temperature")
                .with_source("request_validator"),
        );
        assert_eq!(
            err.to_string(),
            "Validation error: temperature must be within [0, 2] (field: request.temperature, source: request_validator)"
        );
    }

    #[test]
    fn exhausted_display_names_last_error() {
        let err = Error::ChainExhausted {
            last: Box::new(ProviderError::new(ProviderErrorKind::Overloaded, "busy").with_status(503)),
            attempted: vec![],
        };
        assert_eq!(err.to_string(), "All 0 link(s) failed; last error: overloaded (HTTP 503): busy");
        assert_eq!(err.last_provider_error().unwrap().kind, ProviderErrorKind::Overloaded);
    }

    #[test]
    fn cancellation_is_distinct() {
        let err = Error::Cancelled(CancelReason::DeadlineExceeded);
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "Request deadline exceeded");
        assert!(err.last_provider_error().is_none());
    }
}
