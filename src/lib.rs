//! # llm-fallback-router
//!
//! Fallback routing for LLM requests across direct vendor APIs, managed
//! gateways and unified multi-vendor APIs.
//!
//! ## Overview
//!
//! A caller names a logical model and supplies a prompt. The router expands
//! the name into an ordered chain (`[primary, fallback_1, ...]`), tries each
//! link with a bounded retry budget, and returns the first successful
//! completion tagged with the label of the provider that answered. Provider
//! failures never escape individually: the caller sees either a response or
//! one [`Error::ChainExhausted`] carrying the last link's error.
//!
//! ## Core Philosophy
//!
//! - **Configuration-Driven**: models and fallback rules are data (YAML/JSON), validated once
//! - **Provider-Agnostic**: every backend sits behind [`ProviderInvoker`]
//! - **Sequential**: one link at a time, no hedging, no parallel fan-out
//! - **Immutable Snapshots**: concurrent runs share an [`Arc<RouterMapping>`](RouterMapping)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_fallback_router::{FallbackExecutor, ModelRequest, RouterMapping};
//! use llm_fallback_router::transport::HttpInvoker;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> llm_fallback_router::Result<()> {
//!     let mapping = RouterMapping::from_yaml_str(
//!         r#"
//! model_list:
//!   - model_name: gpt-4o
//!     provider_kind: direct
//!     params: { model: gpt-4o }
//!   - model_name: claude-3-5-sonnet
//!     provider_kind: unified
//!     params: { model: anthropic/claude-3-5-sonnet, api_base: "http://localhost:4000/v1" }
//! fallbacks:
//!   - gpt-4o: [claude-3-5-sonnet]
//! "#,
//!     )?;
//!
//!     let executor = FallbackExecutor::new(mapping, Arc::new(HttpInvoker::new()?));
//!     let response = executor
//!         .run("gpt-4o", &ModelRequest::new("Hello!").system_prompt("Be brief."))
//!         .await?;
//!     println!("[{}] {}", response.provider_label, response.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Configuration document, provider kinds and file loading |
//! | [`registry`] | Validated model registry, fallback table and shared mapping handle |
//! | [`routing`] | Chain resolution (general and two-tier) |
//! | [`provider`] | Invoker trait, requests, provider errors and classification |
//! | [`resilience`] | Per-link retry policy and cancellation scope |
//! | [`executor`] | The fallback state machine |
//! | `transport` | OpenAI-compatible HTTP invoker (`http` feature) |

pub mod config;
pub mod error;
pub mod executor;
pub mod provider;
pub mod registry;
pub mod resilience;
pub mod routing;

#[cfg(feature = "http")]
pub mod transport;

// Re-export main types for convenience
pub use config::{ApiStyle, ConfigError, ConfigLoader, ModelEntry, ModelParams, ProviderKind, RouterConfig};
pub use error::{AttemptRecord, CancelReason, Error, ErrorContext};
pub use executor::{EscalationPolicy, FallbackExecutor, RouteResponse, RouteStats, RunOptions};
pub use provider::{
    FailureClass, InvokerSet, ModelRequest, ProviderError, ProviderErrorKind, ProviderInvoker,
};
pub use registry::{FallbackTable, MappingHandle, ModelRegistry, RouterMapping};
pub use resilience::{CancelScope, RetryPolicy};
pub use routing::{ChainResolver, InvocationChain, Link};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
