//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once at startup, wrap in `Arc`, pass clones to dependents.
//! - Both HTTP clients are built eagerly in [`LlmServiceProfiles::new`], so a
//!   broken config fails the boot instead of the first request.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//! let txt = svc.generate("Hello world", None).await?;
//! let emb = svc.embed("Ferris").await?;
//! println!("{txt} / dim = {}", emb.len());
//! # Ok(()) }
//! ```

use tracing::info;

use crate::{
    config::{default_config::configs_from_env, llm_model_config::LlmModelConfig},
    config::llm_provider::LlmProvider,
    error_handler::AiLlmError,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Provider client bound to one profile.
#[derive(Debug)]
enum ProfileClient {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
}

impl ProfileClient {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        match cfg.provider {
            LlmProvider::Ollama => Ok(Self::Ollama(OllamaService::new(cfg.clone())?)),
            LlmProvider::OpenAI => Ok(Self::OpenAI(OpenAiService::new(cfg.clone())?)),
        }
    }
}

/// Generation + embedding clients shared by the whole process.
#[derive(Debug)]
pub struct LlmServiceProfiles {
    generation_cfg: LlmModelConfig,
    embedding_cfg: LlmModelConfig,
    generation: ProfileClient,
    embedding: ProfileClient,
}

impl LlmServiceProfiles {
    /// Builds both clients from explicit configs.
    ///
    /// # Errors
    /// Any provider validation or HTTP client construction error.
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        let gen_client = ProfileClient::build(&generation)?;
        let emb_client = ProfileClient::build(&embedding)?;

        info!(
            generation_provider = ?generation.provider,
            generation_model = %generation.model,
            embedding_provider = ?embedding.provider,
            embedding_model = %embedding.model,
            "LLM profiles ready"
        );

        Ok(Self {
            generation_cfg: generation,
            embedding_cfg: embedding,
            generation: gen_client,
            embedding: emb_client,
        })
    }

    /// Builds both profiles from environment variables (see [`crate::config::default_config`]).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let (generation, embedding) = configs_from_env()?;
        Self::new(generation, embedding)
    }

    /// Generates text with the generation profile.
    ///
    /// # Arguments
    /// - `prompt`: user prompt.
    /// - `system`: optional system instruction.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match &self.generation {
            ProfileClient::Ollama(cli) => cli.generate(prompt, system).await,
            ProfileClient::OpenAI(cli) => cli.generate(prompt, system).await,
        }
    }

    /// Computes one embedding vector with the embedding profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match &self.embedding {
            ProfileClient::Ollama(cli) => cli.embeddings(input).await,
            ProfileClient::OpenAI(cli) => cli.embeddings(input).await,
        }
    }

    /// Returns `(generation, embedding)` configs.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation_cfg, &self.embedding_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_mixed_profiles() {
        let svc = LlmServiceProfiles::new(ollama("llama3"), ollama("nomic-embed-text")).unwrap();
        let (g, e) = svc.profiles();
        assert_eq!(g.model, "llama3");
        assert_eq!(e.model, "nomic-embed-text");
    }

    #[test]
    fn bad_embedding_profile_fails_construction() {
        let mut emb = ollama("nomic-embed-text");
        emb.provider = LlmProvider::OpenAI; // no api key
        assert!(LlmServiceProfiles::new(ollama("llama3"), emb).is_err());
    }
}
