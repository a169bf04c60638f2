use std::{future::Future, pin::Pin};

use crate::error::PipelineError;

/// Provider interface for embedding generation.
///
/// Async because real providers (Ollama, OpenAI) perform HTTP requests.
/// Implement this trait to plug in another backend or a test double.
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, PipelineError>> + Send + 'a>>;
}

pub mod service;
