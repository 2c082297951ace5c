use crate::{Error, ErrorContext, Result};
use std::time::Duration;

/// Provider-agnostic "ask a model" request.
///
/// The same request is sent unchanged to every link of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_prompt: Option<String>,
    pub user_message: String,
    /// Sampling temperature in `[0, 2]`.
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound for a single provider call.
    pub timeout: Duration,
}

impl ModelRequest {
    pub const DEFAULT_TEMPERATURE: f64 = 0.7;
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: None,
            user_message: user_message.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the system prompt. Blank prompts are treated as absent.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = if prompt.trim().is_empty() { None } else { Some(prompt) };
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check parameter ranges before any provider is contacted.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str, field: &str| {
            Err(Error::validation_with_context(
                msg,
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("request_validator"),
            ))
        };

        if self.user_message.trim().is_empty() {
            return invalid("user message must not be empty", "request.user_message");
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature must be within [0, 2]", "request.temperature");
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens must be positive", "request.max_tokens");
        }
        if self.timeout.is_zero() {
            return invalid("timeout must be positive", "request.timeout");
        }
        Ok(())
    }
}
