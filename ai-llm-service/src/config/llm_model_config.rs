use crate::config::llm_provider::LlmProvider;

/// Configuration for a single model profile (generation or embedding).
///
/// # Fields
///
/// - `provider`: backend serving the model.
/// - `model`: model identifier (e.g. `"gpt-4o-mini"`, `"nomic-embed-text"`).
/// - `endpoint`: base URL of the provider, without the API path.
/// - `api_key`: required for OpenAI, ignored by Ollama.
/// - `max_tokens`: generation cap, if the provider supports it.
/// - `temperature`: sampling temperature; `0.0` gives repeatable answers.
/// - `top_p`: nucleus sampling cutoff.
/// - `timeout_secs`: per-request HTTP timeout.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "gpt-4o-mini".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(512),
///     temperature: Some(0.0),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.model, "gpt-4o-mini");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,

    pub model: String,

    pub endpoint: String,

    pub api_key: Option<String>,

    pub max_tokens: Option<u32>,

    pub temperature: Option<f32>,

    pub top_p: Option<f32>,

    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint without trailing slashes, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
