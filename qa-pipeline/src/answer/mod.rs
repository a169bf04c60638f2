//! Answerer: retrieval for one question followed by one generation call.

use std::{future::Future, pin::Pin};

use tracing::{debug, instrument, warn};

use crate::{embed::EmbeddingsProvider, error::PipelineError, index::SimilarityIndex};

pub mod prompt;
pub mod service;

/// Text generation backend.
///
/// Returns the raw model output; failures carry the provider's detail as text.
pub trait Generator: Send + Sync {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>>;
}

/// Answers one question from the `top_k` best chunks of `index`.
///
/// # Errors
/// - retrieval errors ([`PipelineError::NoRelevantChunks`], embedding failures)
/// - [`PipelineError::GenerationError`] if the model call fails
#[instrument(skip_all, fields(question = %question, top_k = top_k))]
pub async fn answer_question(
    question: &str,
    index: &SimilarityIndex,
    top_k: usize,
    embedder: &dyn EmbeddingsProvider,
    generator: &dyn Generator,
) -> Result<String, PipelineError> {
    let hits = index.retrieve(question, top_k, embedder).await?;
    let user = prompt::build_user_prompt(question, &hits);

    let raw = generator
        .generate(prompt::DEFAULT_SYSTEM, &user)
        .await
        .map_err(|detail| {
            warn!(%detail, "generation failed");
            PipelineError::GenerationError {
                question: question.to_string(),
                detail,
            }
        })?;

    debug!(context_chunks = hits.len(), answer_len = raw.len(), "answered");
    Ok(raw.trim().to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::index::tests::{LetterEmbedder, chunk};

    /// Echoes the first context line; fails for prompts containing `fail_on`.
    #[derive(Default)]
    pub(crate) struct EchoGenerator {
        pub(crate) calls: AtomicUsize,
        pub(crate) fail_on: Option<String>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl EchoGenerator {
        pub(crate) fn failing_on(needle: &str) -> Self {
            Self {
                fail_on: Some(needle.to_string()),
                ..Self::default()
            }
        }
    }

    impl Generator for EchoGenerator {
        fn generate<'a>(
            &'a self,
            _system: &'a str,
            prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Box::pin(async move {
                if let Some(needle) = &self.fail_on {
                    if prompt.contains(needle.as_str()) {
                        return Err("HTTP 503 Service Unavailable".to_string());
                    }
                }
                let first = prompt.split("\n\n").nth(1).unwrap_or_default();
                Ok(format!("  {first}\n"))
            })
        }
    }

    #[tokio::test]
    async fn answer_uses_best_chunk_and_trims() {
        let emb = LetterEmbedder::default();
        let chunks = vec![chunk(0, "The sky is blue."), chunk(1, "Fire is hot.")];
        let index = SimilarityIndex::build(chunks, &emb, 2).await.unwrap();
        let generator = EchoGenerator::default();

        let answer = answer_question("sky blue?", &index, 1, &emb, &generator)
            .await
            .unwrap();
        assert_eq!(answer, "The sky is blue.");

        let prompts = generator.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Fire is hot."));
    }

    #[tokio::test]
    async fn generation_failure_keeps_question_and_detail() {
        let emb = LetterEmbedder::default();
        let index = SimilarityIndex::build(vec![chunk(0, "Water is wet.")], &emb, 1)
            .await
            .unwrap();
        let generator = EchoGenerator::failing_on("Is water wet?");

        let err = answer_question("Is water wet?", &index, 10, &emb, &generator)
            .await
            .unwrap_err();
        match err {
            PipelineError::GenerationError { question, detail } => {
                assert_eq!(question, "Is water wet?");
                assert!(detail.contains("503"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
