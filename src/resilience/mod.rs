//! Retry and cancellation primitives.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`retry`] | Bounded in-place retry with exponential backoff for one link |
//! | [`cancel`] | Cancellation token / deadline scope raced against sleeps and calls |
//!
//! ```rust
//! use llm_fallback_router::resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.delay(0), Duration::from_millis(500));
//! assert_eq!(policy.delay(1), Duration::from_secs(1));
//! ```

pub mod cancel;
pub mod retry;

pub use cancel::CancelScope;
pub use retry::{AttemptOutcome, RetryPolicy};
