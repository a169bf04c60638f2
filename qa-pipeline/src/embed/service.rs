//! Embedding provider backed by the shared LLM service profiles.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use tracing::error;

use crate::{embed::EmbeddingsProvider, error::PipelineError};

/// Calls the `embedding` profile of [`LlmServiceProfiles`].
#[derive(Debug, Clone)]
pub struct ServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    expected_dim: Option<usize>,
}

impl ServiceEmbedder {
    /// `expected_dim`: if `Some`, vectors of any other length are rejected.
    pub fn new(svc: Arc<LlmServiceProfiles>, expected_dim: Option<usize>) -> Self {
        Self { svc, expected_dim }
    }
}

impl EmbeddingsProvider for ServiceEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, PipelineError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await.map_err(|e| {
                error!(error = %e, input_len = text.len(), "embedding call failed");
                PipelineError::Embedding(e.to_string())
            })?;
            check_dim(v, self.expected_dim)
        })
    }
}

fn check_dim(v: Vec<f32>, expected: Option<usize>) -> Result<Vec<f32>, PipelineError> {
    if v.is_empty() {
        return Err(PipelineError::Embedding("provider returned an empty vector".into()));
    }
    match expected {
        Some(want) if v.len() != want => Err(PipelineError::Embedding(format!(
            "vector size mismatch: got {}, want {want}",
            v.len()
        ))),
        _ => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_check() {
        assert!(check_dim(vec![0.1, 0.2], Some(2)).is_ok());
        assert!(check_dim(vec![0.1, 0.2], None).is_ok());

        let err = check_dim(vec![0.1], Some(3)).unwrap_err();
        assert!(err.to_string().contains("got 1, want 3"));
        assert!(check_dim(vec![], None).is_err());
    }
}
