//! Bounded in-place retry for a single link.

use crate::config::ModelEntry;
use crate::error::CancelReason;
use crate::provider::{FailureClass, ModelRequest, ProviderError, ProviderErrorKind, ProviderInvoker};
use crate::resilience::CancelScope;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one link's retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success { text: String, attempts: u32 },
    /// The link gave up; `error` is from its last attempt.
    Exhausted {
        error: ProviderError,
        class: FailureClass,
        attempts: u32,
    },
}

impl AttemptOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            AttemptOutcome::Success { attempts, .. } | AttemptOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Retry configuration for a single link.
///
/// Transient failures are retried up to `max_attempts` total calls with
/// exponential backoff `base_delay * 2^i` (capped at `max_delay`). Fatal
/// failures end the loop after the attempt that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// One attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Backoff before retry number `attempt_index + 1` (0-based: first failure => 0).
    pub fn delay(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Call `invoker` for `entry` until it succeeds, fails fatally, or runs out
    /// of attempts. Only a cancellation of `scope` produces `Err`.
    pub async fn invoke<I>(
        &self,
        entry: &ModelEntry,
        request: &ModelRequest,
        invoker: &I,
        scope: &CancelScope,
    ) -> Result<AttemptOutcome, CancelReason>
    where
        I: ProviderInvoker + ?Sized,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            debug!(model = entry.name.as_str(), attempt, max_attempts, "invoking provider");

            let call = tokio::time::timeout(request.timeout, invoker.call(entry, request));
            let error = match scope.run(call).await? {
                Ok(Ok(text)) => return Ok(AttemptOutcome::Success { text, attempts: attempt }),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::new(
                    ProviderErrorKind::Timeout,
                    format!("no response within {} ms", request.timeout.as_millis()),
                ),
            };

            let class = invoker.classify(&error);
            warn!(
                model = entry.name.as_str(),
                attempt,
                error_kind = error.kind.name(),
                failure_class = %class,
                error = %error,
                "provider call failed"
            );

            if class == FailureClass::Fatal || attempt >= max_attempts {
                return Ok(AttemptOutcome::Exhausted {
                    error,
                    class,
                    attempts: attempt,
                });
            }

            let delay = self.delay(attempt - 1);
            debug!(model = entry.name.as_str(), delay_ms = delay.as_millis() as u64, "backing off before retry");
            scope.sleep(delay).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a fixed script of results and records when each call happened.
    struct Scripted {
        script: Mutex<Vec<Result<String, ProviderError>>>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl Scripted {
        fn new(mut script: Vec<Result<String, ProviderError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderInvoker for Scripted {
        async fn call(&self, _: &ModelEntry, _: &ModelRequest) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::new(ProviderErrorKind::Unknown, "script exhausted")))
        }
    }

    fn entry() -> ModelEntry {
        ModelEntry::new("a", ProviderKind::DirectVendor, "model-a")
    }

    fn transient() -> Result<String, ProviderError> {
        Err(ProviderError::new(ProviderErrorKind::RateLimited, "429"))
    }

    #[test]
    fn default_delays() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(0), Duration::from_millis(500));
        assert_eq!(p.delay(1), Duration::from_millis(1000));
        assert_eq!(p.delay(2), Duration::from_millis(2000));
        assert_eq!(p.delay(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_then_success_retries_in_place() {
        let inv = Scripted::new(vec![transient(), transient(), Ok("done".into())]);
        let out = RetryPolicy::default()
            .invoke(&entry(), &ModelRequest::new("hi"), &inv, &CancelScope::default())
            .await
            .unwrap();

        assert_eq!(out, AttemptOutcome::Success { text: "done".into(), attempts: 3 });
        let calls = inv.calls();
        assert_eq!(calls[1] - calls[0], Duration::from_millis(500));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts() {
        let inv = Scripted::new(vec![transient(), transient(), transient(), Ok("late".into())]);
        let out = RetryPolicy::default()
            .invoke(&entry(), &ModelRequest::new("hi"), &inv, &CancelScope::default())
            .await
            .unwrap();

        assert!(matches!(
            out,
            AttemptOutcome::Exhausted { attempts: 3, class: FailureClass::Transient, .. }
        ));
        assert_eq!(inv.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_stops_after_one_attempt() {
        let inv = Scripted::new(vec![
            Err(ProviderError::new(ProviderErrorKind::Authentication, "bad key")),
            Ok("never".into()),
        ]);
        let out = RetryPolicy::default()
            .invoke(&entry(), &ModelRequest::new("hi"), &inv, &CancelScope::default())
            .await
            .unwrap();

        assert_eq!(out.attempts(), 1);
        assert_eq!(inv.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out_as_transient() {
        struct Hang;

        #[async_trait]
        impl ProviderInvoker for Hang {
            async fn call(&self, _: &ModelEntry, _: &ModelRequest) -> Result<String, ProviderError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }

        let req = ModelRequest::new("hi").timeout(Duration::from_secs(2));
        let out = RetryPolicy::none()
            .invoke(&entry(), &req, &Hang, &CancelScope::default())
            .await
            .unwrap();

        match out {
            AttemptOutcome::Exhausted { error, class, .. } => {
                assert_eq!(error.kind, ProviderErrorKind::Timeout);
                assert_eq!(class, FailureClass::Transient);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
