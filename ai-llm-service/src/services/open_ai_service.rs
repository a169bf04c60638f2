//! OpenAI service for chat completion and embeddings.
//!
//! Minimal non-streaming client around the OpenAI REST API. Endpoints are
//! derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions
//! - POST {endpoint}/v1/embeddings
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{decode_error, ensure_success},
};

/// Thin client for the OpenAI API.
///
/// Keeps a preconfigured `reqwest::Client` (timeout + bearer auth header).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider`, `MissingApiKey`, `InvalidEndpoint` on a bad config
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        let base = cfg.base_url().to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let timeout_secs = cfg.timeout_secs.unwrap_or(60);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()?;

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs,
            "OpenAiService initialized"
        );

        Ok(Self {
            url_chat: format!("{base}/v1/chat/completions"),
            url_embeddings: format!("{base}/v1/embeddings"),
            client,
            cfg,
        })
    }

    /// Single non-streaming chat completion.
    ///
    /// Messages: optional `system`, then the `user` prompt. `temperature`,
    /// `top_p` and `max_tokens` come from the config.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);
        let out: ChatCompletionResponse = self
            .post_json(&self.url_chat, &body, "`choices[0].message.content`")
            .await?;

        out.choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices).into())
    }

    /// Retrieves a single embedding vector via `/v1/embeddings`.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };
        let out: EmbeddingsResponse = self
            .post_json(&self.url_embeddings, &body, "`data[0].embedding`")
            .await?;

        out.data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode("empty `data` in embeddings response".into()),
                )
                .into()
            })
    }

    /// One POST round-trip: send, check status, decode.
    async fn post_json<B, T>(&self, url: &str, body: &B, expected: &str) -> Result<T, AiLlmError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let started = Instant::now();
        debug!(model = %self.cfg.model, "POST {url}");

        let resp = self.client.post(url).json(body).send().await?;
        let resp = ensure_success(Provider::OpenAI, &self.cfg.model, resp, url, started).await?;
        let out = resp
            .json::<T>()
            .await
            .map_err(|e| decode_error(Provider::OpenAI, e, expected))?;

        debug!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "{url} completed"
        );
        Ok(out)
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: Some("sk-test".into()),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn requires_api_key() {
        let mut c = cfg();
        c.api_key = None;
        let err = OpenAiService::new(c).unwrap_err();
        assert!(err.to_string().contains("missing API key"));
    }

    #[test]
    fn chat_request_puts_system_first() {
        let c = cfg();
        let body = ChatCompletionRequest::from_cfg(&c, "question", Some("rules"));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "question");
        assert_eq!(v["temperature"], 0.0);
        assert!(v.get("max_tokens").is_none());
    }

    #[test]
    fn decodes_first_non_empty_choice() {
        let raw = r#"{"choices":[{"message":{"content":null}},{"message":{"content":"blue"}}]}"#;
        let out: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = out.choices.into_iter().find_map(|c| c.message.content);
        assert_eq!(content.as_deref(), Some("blue"));
    }
}
