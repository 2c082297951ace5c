//! Fallback executor: the router's only state machine.
//!
//! ```text
//! Idle --run--> Attempting(0)
//! Attempting(i) --success--------------------------> Succeeded
//! Attempting(i) --exhausted, escalate, i+1 < len---> Attempting(i+1)
//! Attempting(i) --exhausted otherwise--------------> Exhausted
//! any state     --cancel/deadline------------------> (Cancelled error)
//! ```
//!
//! Within a link, [`RetryPolicy`] decides how many calls are made. Across
//! links, [`EscalationPolicy`] decides whether a link that gave up hands over
//! to the next one. Everything runs sequentially on the caller's task.

mod policy;
mod types;

pub use policy::EscalationPolicy;
pub use types::{RouteResponse, RouteStats, RunOptions};

use crate::error::AttemptRecord;
use crate::provider::{ModelRequest, ProviderError, ProviderInvoker};
use crate::registry::{MappingHandle, RouterMapping};
use crate::resilience::{AttemptOutcome, CancelScope, RetryPolicy};
use crate::routing::{ChainResolver, InvocationChain};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Retry budget per link: the head of the chain gets `head`, later links `rest`.
struct LinkRetry<'a> {
    head: &'a RetryPolicy,
    rest: &'a RetryPolicy,
}

impl LinkRetry<'_> {
    fn for_link(&self, index: usize) -> &RetryPolicy {
        if index == 0 {
            self.head
        } else {
            self.rest
        }
    }
}

enum State {
    Attempting(usize),
    Succeeded { index: usize, text: String },
    Exhausted(ProviderError),
}

/// Routes a request along its fallback chain.
///
/// Cheap to clone; clones share the mapping handle and invoker.
#[derive(Clone)]
pub struct FallbackExecutor {
    mapping: MappingHandle,
    invoker: Arc<dyn ProviderInvoker>,
    retry: RetryPolicy,
    escalation: EscalationPolicy,
}

impl FallbackExecutor {
    pub fn new(mapping: impl Into<MappingHandle>, invoker: Arc<dyn ProviderInvoker>) -> Self {
        Self {
            mapping: mapping.into(),
            invoker,
            retry: RetryPolicy::default(),
            escalation: EscalationPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Escalation policy used by [`run`](Self::run) and [`run_with`](Self::run_with).
    pub fn with_escalation_policy(mut self, escalation: EscalationPolicy) -> Self {
        self.escalation = escalation;
        self
    }

    /// Current mapping snapshot.
    pub fn mapping(&self) -> Arc<RouterMapping> {
        self.mapping.snapshot()
    }

    pub fn mapping_handle(&self) -> &MappingHandle {
        &self.mapping
    }

    /// Route `request` starting at `primary`, walking its configured chain.
    pub async fn run(&self, primary: &str, request: &ModelRequest) -> Result<RouteResponse> {
        self.run_with(primary, request, RunOptions::default()).await
    }

    pub async fn run_with(
        &self,
        primary: &str,
        request: &ModelRequest,
        options: RunOptions,
    ) -> Result<RouteResponse> {
        let chain = ChainResolver::new(&self.mapping()).resolve(primary)?;
        self.run_chain(&chain, request, options, &self.escalation).await
    }

    /// Two-tier mode.
    ///
    /// With `use_fallback` false the primary runs with the executor's retry
    /// policy and hands over to its first fallback only on the failures
    /// [`EscalationPolicy::two_tier`] names; the fallback is called once.
    /// With `use_fallback` true the primary is skipped and the first fallback
    /// gets a single call.
    pub async fn run_two_tier(
        &self,
        primary: &str,
        request: &ModelRequest,
        use_fallback: bool,
        options: RunOptions,
    ) -> Result<RouteResponse> {
        let chain = ChainResolver::new(&self.mapping()).resolve_two_tier(primary, use_fallback)?;
        let once = RetryPolicy::none();
        let retry = if use_fallback {
            LinkRetry { head: &once, rest: &once }
        } else {
            LinkRetry { head: &self.retry, rest: &once }
        };
        self.run_links(&chain, request, options, &EscalationPolicy::two_tier(), retry)
            .await
    }

    /// Walk an already resolved chain.
    pub async fn run_chain(
        &self,
        chain: &InvocationChain,
        request: &ModelRequest,
        options: RunOptions,
        escalation: &EscalationPolicy,
    ) -> Result<RouteResponse> {
        let retry = LinkRetry {
            head: &self.retry,
            rest: &self.retry,
        };
        self.run_links(chain, request, options, escalation, retry).await
    }

    async fn run_links(
        &self,
        chain: &InvocationChain,
        request: &ModelRequest,
        options: RunOptions,
        escalation: &EscalationPolicy,
        retry: LinkRetry<'_>,
    ) -> Result<RouteResponse> {
        request.validate()?;

        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "route",
            request_id = request_id.as_str(),
            primary = chain.primary().name(),
            chain_len = chain.len()
        );
        let scope = CancelScope::new(options.cancel, options.deadline);

        self.drive(chain, request, &scope, escalation, &retry, request_id)
            .instrument(span)
            .await
    }

    async fn drive(
        &self,
        chain: &InvocationChain,
        request: &ModelRequest,
        scope: &CancelScope,
        escalation: &EscalationPolicy,
        retry: &LinkRetry<'_>,
        request_id: String,
    ) -> Result<RouteResponse> {
        let started = Instant::now();
        let mut attempted: Vec<AttemptRecord> = Vec::with_capacity(chain.len());
        let mut total_attempts = 0u32;
        let mut state = State::Attempting(0);

        scope.check().map_err(Error::Cancelled)?;

        loop {
            state = match state {
                State::Attempting(i) => {
                    let link = &chain.links()[i];
                    let outcome = retry
                        .for_link(i)
                        .invoke(&link.entry, request, self.invoker.as_ref(), scope)
                        .await
                        .map_err(Error::Cancelled)?;
                    total_attempts += outcome.attempts();

                    match outcome {
                        AttemptOutcome::Success { text, .. } => State::Succeeded { index: i, text },
                        AttemptOutcome::Exhausted { error, attempts, .. } => {
                            attempted.push(AttemptRecord {
                                model_name: link.name().to_string(),
                                provider_label: link.provider_label(),
                                attempts,
                                error_kind: error.kind,
                                message: error.message.clone(),
                            });

                            let has_next = i + 1 < chain.len();
                            if has_next && escalation.should_escalate(&error) {
                                info!(
                                    from = link.name(),
                                    to = chain.links()[i + 1].name(),
                                    error_kind = error.kind.name(),
                                    "escalating to next link"
                                );
                                State::Attempting(i + 1)
                            } else {
                                State::Exhausted(error)
                            }
                        }
                    }
                }
                State::Succeeded { index, text } => {
                    let link = &chain.links()[index];
                    let response = RouteResponse {
                        provider_label: link.provider_label(),
                        text,
                        stats: RouteStats {
                            request_id,
                            model_name: link.name().to_string(),
                            link_index: index,
                            total_attempts,
                            duration_ms: started.elapsed().as_millis(),
                        },
                    };
                    info!(
                        provider_label = response.provider_label.as_str(),
                        link_index = index,
                        total_attempts,
                        duration_ms = response.stats.duration_ms as u64,
                        "request served"
                    );
                    return Ok(response);
                }
                State::Exhausted(last) => {
                    error!(
                        links_tried = attempted.len(),
                        total_attempts,
                        error_kind = last.kind.name(),
                        "fallback chain exhausted"
                    );
                    return Err(Error::ChainExhausted {
                        last: Box::new(last),
                        attempted,
                    });
                }
            };
        }
    }
}

impl std::fmt::Debug for FallbackExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackExecutor")
            .field("mapping", &self.mapping)
            .field("retry", &self.retry)
            .field("escalation", &self.escalation)
            .finish_non_exhaustive()
    }
}
