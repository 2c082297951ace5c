//! Provider invocation boundary.
//!
//! The router never talks to a vendor directly. It consumes a narrow
//! capability set, [`ProviderInvoker`]: perform one call for one link, and
//! classify a failure as [`FailureClass::Transient`] or [`FailureClass::Fatal`].
//! Concrete clients (HTTP, SDK wrappers, test stubs) implement it.

pub mod classify;
pub mod error;
pub mod request;

pub use classify::classify_http_failure;
pub use error::{FailureClass, ProviderError, ProviderErrorKind};
pub use request::ModelRequest;

use crate::config::{ModelEntry, ProviderKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Performs the actual call for one resolved link.
#[async_trait]
pub trait ProviderInvoker: Send + Sync {
    /// Send `request` to the backend described by `entry` and return the
    /// reply's text content (empty when the reply has no text parts).
    async fn call(&self, entry: &ModelEntry, request: &ModelRequest) -> Result<String, ProviderError>;

    /// Decide whether a failure is worth retrying on the same link.
    fn classify(&self, error: &ProviderError) -> FailureClass {
        error.kind.class()
    }
}

/// Dispatches each link to the invoker registered for its [`ProviderKind`].
#[derive(Clone, Default)]
pub struct InvokerSet {
    by_kind: HashMap<ProviderKind, Arc<dyn ProviderInvoker>>,
}

impl InvokerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ProviderKind, invoker: Arc<dyn ProviderInvoker>) -> Self {
        self.by_kind.insert(kind, invoker);
        self
    }

    /// Register the same invoker for every provider kind.
    pub fn with_all(mut self, invoker: Arc<dyn ProviderInvoker>) -> Self {
        for kind in ProviderKind::ALL {
            self.by_kind.insert(kind, invoker.clone());
        }
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn ProviderInvoker>> {
        self.by_kind.get(&kind)
    }
}

impl fmt::Debug for InvokerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.by_kind.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("InvokerSet").field("kinds", &kinds).finish()
    }
}

#[async_trait]
impl ProviderInvoker for InvokerSet {
    async fn call(&self, entry: &ModelEntry, request: &ModelRequest) -> Result<String, ProviderError> {
        let kind = entry.provider_kind;
        match self.get(kind) {
            Some(invoker) => invoker
                .call(entry, request)
                .await
                .map_err(|e| e.with_provider(kind)),
            None => Err(ProviderError::new(
                ProviderErrorKind::Unsupported,
                format!("no invoker registered for provider kind '{}'", kind),
            )
            .with_provider(kind)),
        }
    }

    fn classify(&self, error: &ProviderError) -> FailureClass {
        error
            .provider
            .and_then(|k| self.get(k))
            .map(|invoker| invoker.classify(error))
            .unwrap_or_else(|| error.kind.class())
    }
}
