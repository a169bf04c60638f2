use std::str::FromStr;

use crate::error_handler::{AiLlmError, ConfigError};

/// Represents the provider (backend) used for generation and embeddings.
///
/// Selected at startup through `LLM_KIND`.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmProvider;
///
/// let p: LlmProvider = "ollama".parse().unwrap();
/// assert_eq!(p, LlmProvider::Ollama);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI REST API.
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = AiLlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds_case_insensitive() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" chatgpt ".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = "anthropic".parse::<LlmProvider>().unwrap_err();
        assert!(err.to_string().contains("unsupported provider: anthropic"));
    }
}
