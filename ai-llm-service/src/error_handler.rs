//! Unified error handling for `ai-llm-service`.
//!
//! A single top-level error type [`AiLlmError`] is exposed for the whole
//! library. Domain-specific errors live in nested types ([`ConfigError`],
//! [`ProviderError`]). Small helpers for reading environment variables return
//! the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup only).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider answered, but not with something usable.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (connect, TLS, client-side timeout).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// `true` when the failure came from a timeout, either ours or the HTTP client's.
    pub fn is_timeout(&self) -> bool {
        match self {
            AiLlmError::Timeout(_) => true,
            AiLlmError::HttpTransport(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while building configs from the environment.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g. URL without scheme).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Provider that produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => f.write_str("Ollama"),
            Provider::OpenAI => f.write_str("OpenAI"),
        }
    }
}

/// Non-2xx response details.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Trimmed start of the response body.
    pub snippet: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/// What went wrong inside a provider client.
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    /// Client built with a config for another provider.
    InvalidProvider,
    /// OpenAI requires an API key.
    MissingApiKey,
    /// Endpoint is empty or lacks `http://`/`https://`.
    InvalidEndpoint(String),
    HttpStatus(HttpError),
    /// Body could not be decoded into the expected shape.
    Decode(String),
    /// Chat completion returned no usable choice.
    EmptyChoices,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("invalid provider for this client"),
            ProviderErrorKind::MissingApiKey => f.write_str("missing API key"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::HttpStatus(h) => write!(f, "{h}"),
            ProviderErrorKind::Decode(d) => write!(f, "decode error: {d}"),
            ProviderErrorKind::EmptyChoices => f.write_str("response contained no choices"),
        }
    }
}

/// Provider-scoped failure.
#[derive(Debug, Clone, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Clamps a response body to a short single-line snippet for logs and errors.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let mut s: String = flat.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// [`ConfigError::MissingVar`] if the variable is absent or blank.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Fetches an optional environment variable, treating blank as unset.
pub fn opt_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match opt_env(name) {
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match opt_env(name) {
        Some(v) => v.parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// [`ConfigError::InvalidFormat`] otherwise.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    let v = value.trim();
    if v.starts_with("http://") || v.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}
