use crate::error::CancelReason;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied cancellation token and/or deadline for one run.
///
/// Every backoff sleep and in-flight provider call is raced against both;
/// whichever fires first aborts the awaited future.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl CancelScope {
    pub fn new(token: Option<CancellationToken>, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// Non-blocking check.
    pub fn check(&self) -> Result<(), CancelReason> {
        if self.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(CancelReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(CancelReason::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the scope is cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, CancelReason> {
        let cancelled = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(CancelReason::Cancelled),
            _ = expired => Err(CancelReason::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Cancellable sleep.
    pub async fn sleep(&self, duration: Duration) -> Result<(), CancelReason> {
        self.run(tokio::time::sleep(duration)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unscoped_sleep_completes() {
        let scope = CancelScope::default();
        let start = Instant::now();
        scope.sleep(Duration::from_millis(500)).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn token_aborts_sleep() {
        let token = CancellationToken::new();
        let scope = CancelScope::new(Some(token.clone()), None);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let start = Instant::now();
        let res = scope.sleep(Duration::from_secs(10)).await;
        assert_eq!(res, Err(CancelReason::Cancelled));
        assert!(start.elapsed() < Duration::from_millis(200));
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_sleep() {
        let scope = CancelScope::new(None, Some(Instant::now() + Duration::from_millis(250)));
        let res = scope.sleep(Duration::from_secs(10)).await;
        assert_eq!(res, Err(CancelReason::DeadlineExceeded));
    }

    #[tokio::test]
    async fn already_cancelled_wins_over_ready_future() {
        let token = CancellationToken::new();
        token.cancel();
        let scope = CancelScope::new(Some(token), None);
        assert_eq!(scope.check(), Err(CancelReason::Cancelled));
        assert_eq!(scope.run(async { 42 }).await, Err(CancelReason::Cancelled));
    }
}
