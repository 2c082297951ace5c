//! Router configuration shape.
//!
//! A configuration is a mapping with two keys:
//!
//! ```yaml
//! model_list:
//!   - model_name: anthropic-claude-4
//!     provider_kind: direct
//!     params: { model: claude-4-20250115, api_style: anthropic, credential_ref: ANTHROPIC_API_KEY, rpm: 40 }
//!   - model_name: bedrock-claude-4
//!     provider_kind: gateway
//!     params:
//!       model: us.anthropic.claude-sonnet-4-20250514-v1:0
//!       api_base: https://bedrock-runtime.us-east-1.amazonaws.com/openai/v1
//!       region: us-east-1
//!       rpm: 30
//! fallbacks:
//!   - anthropic-claude-4: [bedrock-claude-4]
//! ```
//!
//! These structs only describe the shape. Validation happens once, when a
//! [`RouterMapping`](crate::registry::RouterMapping) is built from them.

pub mod error;
pub mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which family of backend serves a model entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderKind {
    /// A vendor's own API (Anthropic, OpenAI, ...).
    #[serde(rename = "direct", alias = "anthropic", alias = "openai")]
    DirectVendor,
    /// A managed multi-region gateway (e.g. Bedrock).
    #[serde(rename = "gateway", alias = "bedrock")]
    ManagedGateway,
    /// A unified multi-vendor API (e.g. a LiteLLM proxy).
    #[serde(rename = "unified", alias = "litellm")]
    UnifiedMultiVendor,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::DirectVendor,
        ProviderKind::ManagedGateway,
        ProviderKind::UnifiedMultiVendor,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DirectVendor => "direct",
            ProviderKind::ManagedGateway => "gateway",
            ProviderKind::UnifiedMultiVendor => "unified",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format spoken by an entry's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiStyle {
    /// OpenAI-compatible `chat/completions`.
    #[default]
    #[serde(rename = "openai", alias = "openai_chat")]
    OpenAiChat,
    /// Anthropic Messages API.
    #[serde(rename = "anthropic", alias = "anthropic_messages")]
    AnthropicMessages,
}

/// Provider parameters for one model entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Underlying model identifier sent to the provider.
    pub model: String,
    #[serde(
        default,
        alias = "aws_region_name",
        alias = "aws_region",
        skip_serializing_if = "Option::is_none"
    )]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Wire format of `api_base`; OpenAI-compatible when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_style: Option<ApiStyle>,
    /// Name of the environment variable holding the credential. Never the secret itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    /// Requests-per-minute hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<u32>,
    /// Provider-specific parameters the router does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ModelParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            region: None,
            api_base: None,
            api_style: None,
            credential_ref: None,
            rpm: None,
            extra: BTreeMap::new(),
        }
    }
}

/// One registered model: a logical name bound to a provider and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(rename = "model_name")]
    pub name: String,
    #[serde(alias = "litellm_provider")]
    pub provider_kind: ProviderKind,
    pub params: ModelParams,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, provider_kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_kind,
            params: ModelParams::new(model),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.params.region = Some(region.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.params.api_base = Some(api_base.into());
        self
    }

    pub fn with_api_style(mut self, style: ApiStyle) -> Self {
        self.params.api_style = Some(style);
        self
    }

    /// Effective wire format for this entry.
    pub fn api_style(&self) -> ApiStyle {
        self.params.api_style.unwrap_or_default()
    }

    pub fn with_credential_ref(mut self, env_var: impl Into<String>) -> Self {
        self.params.credential_ref = Some(env_var.into());
        self
    }

    pub fn with_rpm(mut self, rpm: u32) -> Self {
        self.params.rpm = Some(rpm);
        self
    }

    /// Human-readable identifier of the backend serving this entry,
    /// formatted as `"<provider_kind>:<underlying model id>"`.
    pub fn provider_label(&self) -> String {
        format!("{}:{}", self.provider_kind, self.params.model)
    }
}

/// Serializable router configuration (`model_list` + `fallbacks`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub model_list: Vec<ModelEntry>,
    /// Ordered single-entry mappings `{primary: [fallback, ...]}`.
    #[serde(default)]
    pub fallbacks: Vec<BTreeMap<String, Vec<String>>>,
}

impl RouterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, entry: ModelEntry) -> Self {
        self.model_list.push(entry);
        self
    }

    pub fn fallback<I, S>(mut self, primary: impl Into<String>, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = BTreeMap::new();
        rule.insert(primary.into(), order.into_iter().map(Into::into).collect());
        self.fallbacks.push(rule);
        self
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
