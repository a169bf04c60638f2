use std::time::Instant;

use tracing::error;

use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

pub mod ollama_service;
pub mod open_ai_service;

/// Passes 2xx responses through; anything else becomes `HttpStatus` with a body snippet.
pub(crate) async fn ensure_success(
    provider: Provider,
    model: &str,
    resp: reqwest::Response,
    url: &str,
    started: Instant,
) -> Result<reqwest::Response, AiLlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let snippet = make_snippet(&resp.text().await.unwrap_or_default());

    error!(
        %provider,
        %status,
        %url,
        %snippet,
        model,
        latency_ms = started.elapsed().as_millis(),
        "provider returned non-success status"
    );

    Err(ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
        }),
    )
    .into())
}

/// Decode failure with a hint about the expected shape.
pub(crate) fn decode_error(provider: Provider, err: reqwest::Error, expected: &str) -> AiLlmError {
    ProviderError::new(
        provider,
        ProviderErrorKind::Decode(format!("serde error: {err}; expected {expected}")),
    )
    .into()
}
