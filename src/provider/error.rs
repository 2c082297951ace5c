//! Provider failure taxonomy.

use crate::config::ProviderKind;
use std::fmt;

/// How the router reacts to a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Worth retrying on the same link (connectivity, rate limit, upstream 5xx).
    Transient,
    /// Retrying the same link cannot help; escalate at once.
    Fatal,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Transient => f.write_str("transient"),
            FailureClass::Fatal => f.write_str("fatal"),
        }
    }
}

/// Normalized failure kinds reported at the invocation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Connection refused/reset, DNS failure, broken stream
    Connection,
    /// Call did not complete within the request timeout
    Timeout,
    /// Request rate limit exceeded
    RateLimited,
    /// Internal server error on provider side
    ServerError,
    /// Provider temporarily overloaded or unavailable
    Overloaded,
    /// Invalid, expired or rejected credential
    Authentication,
    /// No credential could be resolved for the link
    MissingCredential,
    /// Valid credentials but insufficient permissions
    PermissionDenied,
    /// Model or endpoint does not exist at the provider
    NotFound,
    /// Malformed request rejected by the provider
    InvalidRequest,
    /// Input exceeds the provider's payload or context limits
    RequestTooLarge,
    /// Account quota or billing limit reached
    QuotaExhausted,
    /// No invoker is wired for the link's provider kind
    Unsupported,
    /// Error could not be classified
    Unknown,
}

impl ProviderErrorKind {
    /// Standard snake_case name (e.g. `"rate_limited"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Authentication => "authentication",
            Self::MissingCredential => "missing_credential",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::RequestTooLarge => "request_too_large",
            Self::QuotaExhausted => "quota_exhausted",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
        }
    }

    /// Default retry classification for this kind.
    #[inline]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Connection
            | Self::Timeout
            | Self::RateLimited
            | Self::ServerError
            | Self::Overloaded => FailureClass::Transient,
            _ => FailureClass::Fatal,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}: {message}", fmt_status(.status, .provider_code))]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Vendor error code/type string, when the provider returned one.
    pub provider_code: Option<String>,
    /// Provider kind that produced the error (set by [`InvokerSet`](crate::provider::InvokerSet)).
    pub provider: Option<ProviderKind>,
}

fn fmt_status(status: &Option<u16>, code: &Option<String>) -> String {
    match (status, code) {
        (Some(s), Some(c)) => format!(" (HTTP {}, {})", s, c),
        (Some(s), None) => format!(" (HTTP {})", s),
        (None, Some(c)) => format!(" ({})", c),
        (None, None) => String::new(),
    }
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            provider_code: None,
            provider: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn class(&self) -> FailureClass {
        self.kind.class()
    }
}
