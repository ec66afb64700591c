//! HTTP client for OpenAI-compatible chat-completion APIs.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::limiter::RateLimiter;
use crate::types::{ChatRequest, ChatResponse};

/// Backend provider.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Any OpenAI-compatible chat-completions API.
    OpenAiCompatible {
        /// Base URL, without the `/v1/...` path.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No backend configured — every call fails, triggering the
    /// adapter's documented fallbacks.
    None,
}

/// Rate-limited HTTP client for the text-completion service.
pub struct BackendClient {
    provider: Provider,
    http: Client,
    limiter: RateLimiter,
}

impl BackendClient {
    /// Create a client.
    #[must_use]
    pub fn new(provider: Provider, limiter: RateLimiter) -> Self {
        Self {
            provider,
            http: Client::new(),
            limiter,
        }
    }

    /// Create a client with no backend (all calls fail → fallbacks).
    #[must_use]
    pub fn none() -> Self {
        Self::new(Provider::None, RateLimiter::new(Duration::ZERO))
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, Provider::None)
    }

    /// Send one chat-completion request. Waits on the shared rate
    /// limiter before dispatching.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let (base_url, api_key) = match &self.provider {
            Provider::None => {
                return Err(LlmError::Unavailable("no backend provider configured".into()));
            }
            Provider::OpenAiCompatible { base_url, api_key } => (base_url, api_key),
        };

        self.limiter.acquire().await;

        let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .timeout(Duration::from_millis(request.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(request.timeout_ms)
                } else {
                    LlmError::from(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, "backend returned error status");
            return Err(LlmError::RequestFailed(format!("HTTP {status}: {detail}")));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        let prompt_tokens = payload["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = payload["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32;

        debug!(prompt_tokens, completion_tokens, "backend call completed");

        Ok(ChatResponse {
            text,
            prompt_tokens,
            completion_tokens,
        })
    }
}
