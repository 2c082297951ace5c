//! Credential and endpoint resolution for HTTP-backed links.
//!
//! Per-entry settings take precedence over process-wide defaults.

use crate::config::{ApiStyle, ModelEntry, ProviderKind};
use crate::provider::{ProviderError, ProviderErrorKind};
use keyring::Entry;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Keyring service name under which credentials are looked up.
pub const KEYRING_SERVICE: &str = "llm-fallback-router";

const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com/v1";
const ANTHROPIC_DEFAULT_BASE: &str = "https://api.anthropic.com/v1";

/// Keyring user and default key/base environment variables for an entry.
fn defaults_for(entry: &ModelEntry) -> (&'static str, &'static str, &'static str) {
    match (entry.provider_kind, entry.api_style()) {
        (ProviderKind::DirectVendor, ApiStyle::AnthropicMessages) => {
            ("anthropic", "ANTHROPIC_API_KEY", "ANTHROPIC_BASE_URL")
        }
        (ProviderKind::DirectVendor, ApiStyle::OpenAiChat) => {
            ("direct", "OPENAI_API_KEY", "OPENAI_BASE_URL")
        }
        (ProviderKind::ManagedGateway, _) => {
            ("gateway", "BEDROCK_OPENAI_API_KEY", "BEDROCK_OPENAI_BASE_URL")
        }
        (ProviderKind::UnifiedMultiVendor, _) => ("unified", "LITELLM_API_KEY", "LITELLM_BASE_URL"),
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves API keys and base URLs for a link.
///
/// Keyring lookups block on the OS secret store, so they run on the blocking
/// pool and their result (hit or miss) is cached per keyring user.
#[derive(Clone)]
pub struct CredentialResolver {
    use_keyring: bool,
    keyring_cache: Arc<Mutex<HashMap<&'static str, Option<String>>>>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self {
            use_keyring: true,
            keyring_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("use_keyring", &self.use_keyring)
            .finish_non_exhaustive()
    }
}

impl CredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the OS keyring (headless hosts, tests).
    pub fn without_keyring(mut self) -> Self {
        self.use_keyring = false;
        self
    }

    /// API key for `entry`.
    ///
    /// Order: the entry's `credential_ref` environment variable, the OS
    /// keyring (`llm-fallback-router` / provider kind, or `anthropic` for
    /// direct Anthropic entries), then the default environment variable for
    /// the entry. Nothing found is a [`ProviderErrorKind::MissingCredential`]
    /// failure, which is never retried.
    pub async fn api_key(&self, entry: &ModelEntry) -> Result<String, ProviderError> {
        if let Some(ref var) = entry.params.credential_ref {
            if let Some(key) = env_non_empty(var) {
                return Ok(key);
            }
        }

        let (keyring_user, default_var, _) = defaults_for(entry);
        if self.use_keyring {
            if let Some(key) = self.keyring_password(keyring_user).await {
                return Ok(key);
            }
        }

        if let Some(key) = env_non_empty(default_var) {
            return Ok(key);
        }

        let mut tried: Vec<&str> = entry.params.credential_ref.iter().map(String::as_str).collect();
        tried.push(default_var);
        Err(ProviderError::new(
            ProviderErrorKind::MissingCredential,
            format!(
                "no credential for model '{}' (checked {})",
                entry.name,
                tried.join(", ")
            ),
        ))
    }

    async fn keyring_password(&self, user: &'static str) -> Option<String> {
        if let Ok(cache) = self.keyring_cache.lock() {
            if let Some(hit) = cache.get(user) {
                return hit.clone();
            }
        }

        let password = tokio::task::spawn_blocking(move || {
            Entry::new(KEYRING_SERVICE, user)
                .and_then(|e| e.get_password())
                .ok()
        })
        .await
        .ok()
        .flatten();

        if let Ok(mut cache) = self.keyring_cache.lock() {
            cache.insert(user, password.clone());
        }
        password
    }

    /// Base URL for `entry`: its `api_base`, else the entry's default
    /// environment variable, else the vendor's public endpoint for direct links.
    pub fn base_url(&self, entry: &ModelEntry) -> Result<String, ProviderError> {
        if let Some(ref base) = entry.params.api_base {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let (_, _, base_var) = defaults_for(entry);
        if let Some(base) = env_non_empty(base_var) {
            return Ok(base.trim_end_matches('/').to_string());
        }
        match (entry.provider_kind, entry.api_style()) {
            (ProviderKind::DirectVendor, ApiStyle::OpenAiChat) => Ok(OPENAI_DEFAULT_BASE.to_string()),
            (ProviderKind::DirectVendor, ApiStyle::AnthropicMessages) => {
                Ok(ANTHROPIC_DEFAULT_BASE.to_string())
            }
            _ => Err(ProviderError::new(
                ProviderErrorKind::InvalidRequest,
                format!(
                    "no api_base for model '{}' and {} is not set",
                    entry.name, base_var
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_reference_beats_default() {
        env::set_var("ROUTER_TEST_KEY_OVERRIDE", "sk-entry");
        let entry = ModelEntry::new("a", ProviderKind::DirectVendor, "gpt-4o")
            .with_credential_ref("ROUTER_TEST_KEY_OVERRIDE");
        let key = CredentialResolver::new().without_keyring().api_key(&entry).await.unwrap();
        assert_eq!(key, "sk-entry");
    }

    #[tokio::test]
    async fn missing_credential_is_fatal() {
        env::remove_var("BEDROCK_OPENAI_API_KEY");
        let entry = ModelEntry::new("b", ProviderKind::ManagedGateway, "llama")
            .with_credential_ref("ROUTER_TEST_KEY_NEVER_SET");
        let err = CredentialResolver::new()
            .without_keyring()
            .api_key(&entry)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MissingCredential);
        assert!(err.message.contains("ROUTER_TEST_KEY_NEVER_SET"));
        assert!(err.message.contains("BEDROCK_OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn anthropic_entries_use_anthropic_defaults() {
        env::remove_var("ANTHROPIC_API_KEY");
        let entry = ModelEntry::new("c", ProviderKind::DirectVendor, "claude-4")
            .with_api_style(ApiStyle::AnthropicMessages);
        let resolver = CredentialResolver::new().without_keyring();

        let err = resolver.api_key(&entry).await.unwrap_err();
        assert!(err.message.contains("ANTHROPIC_API_KEY"));
        if env::var("ANTHROPIC_BASE_URL").is_err() {
            assert_eq!(resolver.base_url(&entry).unwrap(), "https://api.anthropic.com/v1");
        }
    }

    #[tokio::test]
    async fn cached_keyring_value_is_reused() {
        let resolver = CredentialResolver::new();
        resolver
            .keyring_cache
            .lock()
            .unwrap()
            .insert("unified", Some("sk-cached".to_string()));

        let entry = ModelEntry::new("u", ProviderKind::UnifiedMultiVendor, "m");
        assert_eq!(resolver.api_key(&entry).await.unwrap(), "sk-cached");
    }

    #[test]
    fn base_url_precedence() {
        let resolver = CredentialResolver::new();
        let entry = ModelEntry::new("a", ProviderKind::UnifiedMultiVendor, "m")
            .with_api_base("http://proxy.local:4000/v1/");
        assert_eq!(resolver.base_url(&entry).unwrap(), "http://proxy.local:4000/v1");
    }
}
