//! Mapping raw provider failures onto [`ProviderErrorKind`].
//!
//! Structured vendor codes win over HTTP status; message heuristics are only
//! consulted when the status alone is ambiguous (400/404/unknown).

use super::error::ProviderErrorKind;
use once_cell::sync::Lazy;
use regex::Regex;

static AUTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(invalid|incorrect|missing|expired)\W+(\w+\W+){0,2}(api[\s_-]?key|token|credential|signature)")
        .expect("auth pattern is valid")
});

static MODEL_NOT_FOUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)model\b.*\b(not found|does not exist|decommissioned|no longer supported|not supported)")
        .expect("model pattern is valid")
});

static RATE_LIMIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(rate[\s_-]?limit|too many requests|throttl)").expect("rate pattern is valid")
});

static OVERLOADED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(overloaded|service unavailable|temporarily unavailable|at capacity)")
        .expect("overload pattern is valid")
});

impl ProviderErrorKind {
    /// Classify by HTTP status alone.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 408 | 422 => Self::InvalidRequest,
            401 => Self::Authentication,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            413 => Self::RequestTooLarge,
            429 => Self::RateLimited,
            503 | 529 => Self::Overloaded,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Map a vendor error code or type string (OpenAI, Anthropic, Bedrock
    /// styles) to a kind. Case-insensitive; `None` when unrecognized.
    pub fn from_provider_code(code: &str) -> Option<Self> {
        let kind = match code.trim().to_ascii_lowercase().as_str() {
            "rate_limit_exceeded" | "rate_limit_error" | "throttlingexception"
            | "toomanyrequestsexception" => Self::RateLimited,
            "overloaded_error" | "serviceunavailableexception" | "modelnotreadyexception" => {
                Self::Overloaded
            }
            "server_error" | "api_error" | "internalserverexception" => Self::ServerError,
            "timeout" | "modeltimeoutexception" => Self::Timeout,
            "invalid_api_key" | "authentication_error" | "unrecognizedclientexception"
            | "expiredtokenexception" => Self::Authentication,
            "permission_error" | "permission_denied" | "accessdeniedexception" => {
                Self::PermissionDenied
            }
            "model_not_found" | "not_found_error" | "model_decommissioned"
            | "resourcenotfoundexception" => Self::NotFound,
            "insufficient_quota" | "servicequotaexceededexception" => Self::QuotaExhausted,
            "context_length_exceeded" | "request_too_large" => Self::RequestTooLarge,
            "invalid_request_error" | "validationexception" => Self::InvalidRequest,
            _ => return None,
        };
        Some(kind)
    }

    /// Heuristic classification from free-form error text.
    pub fn from_message(message: &str) -> Option<Self> {
        if AUTH_RE.is_match(message) {
            Some(Self::Authentication)
        } else if MODEL_NOT_FOUND_RE.is_match(message) {
            Some(Self::NotFound)
        } else if RATE_LIMIT_RE.is_match(message) {
            Some(Self::RateLimited)
        } else if OVERLOADED_RE.is_match(message) {
            Some(Self::Overloaded)
        } else {
            None
        }
    }
}

/// Classify a non-success HTTP response.
pub fn classify_http_failure(status: u16, code: Option<&str>, message: &str) -> ProviderErrorKind {
    if let Some(kind) = code.and_then(ProviderErrorKind::from_provider_code) {
        return kind;
    }
    let by_status = ProviderErrorKind::from_http_status(status);
    match by_status {
        ProviderErrorKind::InvalidRequest
        | ProviderErrorKind::NotFound
        | ProviderErrorKind::Unknown => ProviderErrorKind::from_message(message).unwrap_or(by_status),
        other => other,
    }
}
