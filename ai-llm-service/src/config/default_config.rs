//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are needed by the QA service:
//!
//! - **Generation** → answers questions from retrieved context
//! - **Embedding**  → turns chunks and questions into vectors
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = `openai` (default) or `ollama`
//! - `LLM_MAX_TOKENS`   = optional generation cap (u32)
//! - `LLM_TIMEOUT_SECS` = optional per-request timeout (u64, default 60)
//! - `EMBEDDING_MODEL`  = embedding model (mandatory)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` = API key (mandatory)
//! - `OPENAI_URL`     = base URL (default `https://api.openai.com`)
//! - `OPENAI_MODEL`   = chat model (mandatory)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Reads `LLM_KIND`, defaulting to OpenAI.
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match opt_env("LLM_KIND") {
        Some(kind) => kind.parse(),
        None => Ok(LlmProvider::OpenAI),
    }
}

/// Builds the `(generation, embedding)` pair for the provider in `LLM_KIND`.
pub fn configs_from_env() -> Result<(LlmModelConfig, LlmModelConfig), AiLlmError> {
    match provider_from_env()? {
        LlmProvider::OpenAI => Ok((config_openai_generation()?, config_openai_embedding()?)),
        LlmProvider::Ollama => Ok((config_ollama_generation()?, config_ollama_embedding()?)),
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok(url)
}

fn timeout_secs() -> Result<Option<u64>, AiLlmError> {
    Ok(Some(
        env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
    ))
}

/// Ollama generation model. `temperature = 0.0` for repeatable answers.
pub fn config_ollama_generation() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: timeout_secs()?,
    })
}

/// Ollama embedding model (`EMBEDDING_MODEL`).
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: timeout_secs()?,
    })
}

/// OpenAI chat model (`OPENAI_MODEL`). `temperature = 0.0` for repeatable answers.
pub fn config_openai_generation() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: must_env("OPENAI_MODEL")?,
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: timeout_secs()?,
    })
}

/// OpenAI embedding model (`EMBEDDING_MODEL`).
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: must_env("EMBEDDING_MODEL")?,
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: timeout_secs()?,
    })
}
