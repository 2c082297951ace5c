use crate::config::{ApiStyle, ModelEntry};
use crate::provider::{
    classify_http_failure, ModelRequest, ProviderError, ProviderErrorKind, ProviderInvoker,
};
use crate::transport::CredentialResolver;
use async_trait::async_trait;
use reqwest::Proxy;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::debug;

/// Anthropic Messages API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// [`ProviderInvoker`] for HTTP model endpoints.
///
/// The wire format follows the entry's [`ApiStyle`]: OpenAI-compatible
/// `chat/completions` (direct OpenAI links, unified proxies, gateway
/// OpenAI-compatible endpoints) or Anthropic `messages`. The link's
/// `api_base` and credential decide where the request goes.
pub struct HttpInvoker {
    client: reqwest::Client,
    credentials: CredentialResolver,
}

impl HttpInvoker {
    pub fn new() -> crate::Result<Self> {
        // Minimal production-friendly defaults (env-overridable).
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(
                env::var("LLM_ROUTER_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("LLM_ROUTER_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        Ok(Self::with_client(builder.build()?, CredentialResolver::new()))
    }

    pub fn with_client(client: reqwest::Client, credentials: CredentialResolver) -> Self {
        Self { client, credentials }
    }

    pub fn with_credentials(mut self, credentials: CredentialResolver) -> Self {
        self.credentials = credentials;
        self
    }

    fn build_chat_body(entry: &ModelEntry, request: &ModelRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.user_message}));

        json!({
            "model": entry.params.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Anthropic takes the system prompt as a top-level field.
    fn build_messages_body(entry: &ModelEntry, request: &ModelRequest) -> Value {
        let mut body = json!({
            "model": entry.params.model,
            "messages": [{"role": "user", "content": request.user_message}],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if let Some(ref system) = request.system_prompt {
            body["system"] = json!(system);
        }
        body
    }

    fn concat_text_parts(content: Option<&Value>) -> String {
        match content {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(parts)) => parts
                .iter()
                .filter(|p| p.get("type").and_then(|t| t.as_str()).map_or(true, |t| t == "text"))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect(),
            _ => String::new(),
        }
    }

    /// Concatenate every text part of the first choice's message.
    fn extract_text(body: &Value) -> String {
        Self::concat_text_parts(
            body.get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .and_then(|m| m.get("content")),
        )
    }

    /// Concatenate the `text` blocks of a Messages response.
    fn extract_messages_text(body: &Value) -> String {
        Self::concat_text_parts(body.get("content"))
    }

    fn error_from_response(status: u16, body: &str) -> ProviderError {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let err_obj = json.as_ref().and_then(|j| j.get("error"));

        let code = err_obj
            .and_then(|e| e.get("code").or_else(|| e.get("type")))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let message = err_obj
            .and_then(|e| e.get("message"))
            .or_else(|| json.as_ref().and_then(|j| j.get("message")))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.chars().take(512).collect());

        let kind = classify_http_failure(status, code.as_deref(), &message);
        let mut err = ProviderError::new(kind, message).with_status(status);
        if let Some(code) = code {
            err = err.with_provider_code(code);
        }
        err
    }

    fn map_transport_error(e: reqwest::Error) -> ProviderError {
        let kind = if e.is_timeout() {
            ProviderErrorKind::Timeout
        } else if e.is_decode() || e.is_body() {
            ProviderErrorKind::ServerError
        } else {
            ProviderErrorKind::Connection
        };
        ProviderError::new(kind, e.to_string())
    }
}

#[async_trait]
impl ProviderInvoker for HttpInvoker {
    async fn call(&self, entry: &ModelEntry, request: &ModelRequest) -> Result<String, ProviderError> {
        let style = entry.api_style();
        let base = self.credentials.base_url(entry)?;
        let api_key = self.credentials.api_key(entry).await?;

        let (url, builder) = match style {
            ApiStyle::OpenAiChat => {
                let url = format!("{}/chat/completions", base);
                let builder = self
                    .client
                    .post(&url)
                    .bearer_auth(api_key)
                    .json(&Self::build_chat_body(entry, request));
                (url, builder)
            }
            ApiStyle::AnthropicMessages => {
                let url = format!("{}/messages", base);
                let builder = self
                    .client
                    .post(&url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&Self::build_messages_body(entry, request));
                (url, builder)
            }
        };

        let start = std::time::Instant::now();
        let resp = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(Self::map_transport_error)?;
        debug!(
            http_status = status,
            url = url.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            api_style = ?style,
            "model response"
        );

        if !(200..300).contains(&status) {
            return Err(Self::error_from_response(status, &body));
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            ProviderError::new(
                ProviderErrorKind::ServerError,
                format!("response is not valid JSON: {}", e),
            )
            .with_status(status)
        })?;
        Ok(match style {
            ApiStyle::OpenAiChat => Self::extract_text(&json),
            ApiStyle::AnthropicMessages => Self::extract_messages_text(&json),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_puts_system_before_user() {
        let entry = ModelEntry::new("a", crate::config::ProviderKind::DirectVendor, "gpt-4o");
        let req = ModelRequest::new("hi").system_prompt("be brief").max_tokens(50);
        let body = HttpInvoker::build_chat_body(&entry, &req);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["max_tokens"], 50);
    }

    #[test]
    fn messages_body_lifts_system_prompt() {
        let entry = ModelEntry::new("c", crate::config::ProviderKind::DirectVendor, "claude-4")
            .with_api_style(ApiStyle::AnthropicMessages);
        let req = ModelRequest::new("hi").system_prompt("be brief");
        let body = HttpInvoker::build_messages_body(&entry, &req);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");

        let body = HttpInvoker::build_messages_body(&entry, &ModelRequest::new("hi"));
        assert!(body.get("system").is_none());
    }

    #[test]
    fn messages_text_blocks_are_concatenated() {
        let body = json!({"content": [
            {"type": "text", "text": "Hello"},
            {"type": "tool_use", "id": "t1", "name": "x", "input": {}},
            {"type": "text", "text": ", world"}
        ]});
        assert_eq!(HttpInvoker::extract_messages_text(&body), "Hello, world");
    }

    #[test]
    fn text_parts_are_concatenated() {
        let body = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "Hello"},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": ", world"}
        ]}}]});
        assert_eq!(HttpInvoker::extract_text(&body), "Hello, world");
    }

    #[test]
    fn no_text_parts_gives_empty_string() {
        assert_eq!(HttpInvoker::extract_text(&json!({"choices": []})), "");
        assert_eq!(
            HttpInvoker::extract_text(&json!({"choices": [{"message": {"content": null}}]})),
            ""
        );
    }

    #[test]
    fn anthropic_style_error_body() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = HttpInvoker::error_from_response(529, body);
        assert_eq!(err.kind, ProviderErrorKind::Overloaded);
        assert_eq!(err.provider_code.as_deref(), Some("overloaded_error"));
    }

    #[test]
    fn plain_text_error_body() {
        let err = HttpInvoker::error_from_response(502, "<html>bad gateway</html>");
        assert_eq!(err.kind, ProviderErrorKind::ServerError);
        assert_eq!(err.message, "<html>bad gateway</html>");
    }
}
