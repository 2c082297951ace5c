use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-run cancellation controls.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cancel: Option<CancellationToken>,
    pub deadline: Option<Instant>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline relative to now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// Per-run statistics for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStats {
    pub request_id: String,
    /// Logical name of the model that answered.
    pub model_name: String,
    /// Chain position of the link that answered (0 = primary).
    pub link_index: usize,
    /// Provider calls made across all links.
    pub total_attempts: u32,
    pub duration_ms: u128,
}

/// Successful run result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    /// `"<provider_kind>:<underlying model id>"` of the serving link.
    pub provider_label: String,
    pub text: String,
    pub stats: RouteStats,
}

impl RouteResponse {
    /// `(provider_label, text)`
    pub fn into_parts(self) -> (String, String) {
        (self.provider_label, self.text)
    }

    pub fn served_by_fallback(&self) -> bool {
        self.stats.link_index > 0
    }
}
