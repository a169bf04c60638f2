//! Lightweight Ollama client for text generation and embeddings.
//!
//! Endpoints:
//! - `POST {endpoint}/api/generate`: non-streaming generation (`stream=false`)
//! - `POST {endpoint}/api/embed`: embeddings for a single input
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{LlmModelConfig, LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.0),
//!     top_p: None,
//!     timeout_secs: Some(30),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.generate("Write a haiku about Rust.", None).await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    services::{decode_error, ensure_success},
};

/// Thin client for Ollama.
///
/// Reuses one `reqwest::Client` whose timeout comes from the config.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Ollama
    /// - `InvalidEndpoint` if `cfg.endpoint` lacks an http(s) scheme
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let base = cfg.base_url();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(60));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let url_generate = format!("{base}/api/generate");
        let url_embed = format!("{base}/api/embed");

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embed,
        })
    }

    /// Performs a non-streaming generation request via `/api/generate`.
    ///
    /// `system` maps to Ollama's `system` field and overrides the modelfile prompt.
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_len = prompt.len()))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, system);
        let out: GenerateResponse = self
            .post_json(&self.url_generate, &body, "`response`")
            .await?;
        Ok(out.response)
    }

    /// Retrieves one embedding vector via `/api/embed`.
    #[instrument(skip_all, fields(model = %self.cfg.model, input_len = input.len()))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbedRequest {
            model: &self.cfg.model,
            input,
        };
        let out: EmbedResponse = self
            .post_json(&self.url_embed, &body, "`{ embeddings: number[][] }`")
            .await?;

        out.embeddings.into_iter().next().ok_or_else(|| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode("empty `embeddings` in response".into()),
            )
            .into()
        })
    }

    async fn post_json<B, T>(&self, url: &str, body: &B, expected: &str) -> Result<T, AiLlmError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let started = Instant::now();
        debug!("POST {url}");

        let resp = self.client.post(url).json(body).send().await?;
        let resp = ensure_success(Provider::Ollama, &self.cfg.model, resp, url, started).await?;
        let out = resp
            .json::<T>()
            .await
            .map_err(|e| decode_error(Provider::Ollama, e, expected))?;

        debug!(latency_ms = started.elapsed().as_millis(), "{url} completed");
        Ok(out)
    }
}

/* ==========================
HTTP payloads & options
========================== */

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            model: &cfg.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
            },
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3".into(),
            endpoint: "http://localhost:11434/".into(),
            api_key: None,
            max_tokens: Some(128),
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_foreign_provider() {
        let mut c = cfg();
        c.provider = LlmProvider::OpenAI;
        assert!(OllamaService::new(c).is_err());
    }

    #[test]
    fn builds_urls_without_double_slash() {
        let svc = OllamaService::new(cfg()).unwrap();
        assert_eq!(svc.url_generate, "http://localhost:11434/api/generate");
        assert_eq!(svc.url_embed, "http://localhost:11434/api/embed");
    }

    #[test]
    fn generate_request_shape() {
        let c = cfg();
        let body = GenerateRequest::from_cfg(&c, "hi", Some("be brief"));
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["stream"], false);
        assert_eq!(v["system"], "be brief");
        assert_eq!(v["options"]["num_predict"], 128);
        assert!(v["options"].get("top_p").is_none());
    }
}
