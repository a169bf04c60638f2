//! Bounded fan-out of retrieval + generation across questions.

use std::collections::{BTreeMap, HashSet};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    answer::{Generator, answer_question},
    cfg::{FailurePolicy, PipelineConfig},
    embed::EmbeddingsProvider,
    error::PipelineError,
    index::SimilarityIndex,
};

/// Result for one question in the response body.
///
/// Serializes as the bare answer string, or as `{ "error": CODE, "message": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerOutcome {
    Answer(String),
    Failed { error: String, message: String },
}

impl AnswerOutcome {
    pub fn failed(err: &PipelineError) -> Self {
        AnswerOutcome::Failed {
            error: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_answer(&self) -> bool {
        matches!(self, AnswerOutcome::Answer(_))
    }
}

/// Question text to outcome, iterated in sorted order.
pub type AnswerSheet = BTreeMap<String, AnswerOutcome>;

/// Drops repeated questions, keeping the first occurrence's position.
pub fn distinct_questions(questions: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(questions.len());
    questions
        .into_iter()
        .filter(|q| seen.insert(q.clone()))
        .collect()
}

/// Answers every question against the shared index.
///
/// At most `min(qa_concurrency, questions.len())` questions are in flight.
/// Under [`FailurePolicy::Abort`] the first failure is returned and the
/// remaining in-flight questions are dropped.
pub async fn answer_all(
    questions: &[String],
    index: &SimilarityIndex,
    cfg: &PipelineConfig,
    embedder: &dyn EmbeddingsProvider,
    generator: &dyn Generator,
) -> Result<AnswerSheet, PipelineError> {
    let width = cfg.qa_concurrency.min(questions.len()).max(1);
    info!(
        questions = questions.len(),
        concurrency = width,
        policy = ?cfg.failure_policy,
        "answering questions"
    );

    let mut results = stream::iter(questions)
        .map(|q| async move {
            let res = answer_question(q, index, cfg.top_k, embedder, generator).await;
            (q, res)
        })
        .buffer_unordered(width)
        .boxed();

    let mut sheet = AnswerSheet::new();
    let mut failed = 0usize;

    while let Some((q, res)) = results.next().await {
        let outcome = match res {
            Ok(answer) => AnswerOutcome::Answer(answer),
            Err(err) if cfg.failure_policy == FailurePolicy::Abort => {
                warn!(question = %q, error = %err, "question failed, aborting batch");
                return Err(err);
            }
            Err(err) => {
                warn!(question = %q, error = %err, "question failed");
                failed += 1;
                AnswerOutcome::failed(&err)
            }
        };
        sheet.insert(q.clone(), outcome);
    }

    info!(
        answered = sheet.len() - failed,
        failed, "all questions processed"
    );
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin, sync::atomic::Ordering};

    use super::*;
    use crate::answer::tests::EchoGenerator;
    use crate::index::tests::{InFlight, LetterEmbedder, chunk};

    #[derive(Default)]
    struct SlowGenerator {
        in_flight: InFlight,
    }

    impl Generator for SlowGenerator {
        fn generate<'a>(
            &'a self,
            _system: &'a str,
            _prompt: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
            Box::pin(async move {
                self.in_flight.hold().await;
                Ok("ok".to_string())
            })
        }
    }

    fn qs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn small_index(emb: &LetterEmbedder) -> SimilarityIndex {
        let chunks = vec![
            chunk(0, "The sky is blue."),
            chunk(1, "Water is wet."),
            chunk(2, "Fire is hot."),
        ];
        SimilarityIndex::build(chunks, emb, 4).await.unwrap()
    }

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let out = distinct_questions(qs(&["b", "a", "b", "c", "a"]));
        assert_eq!(out, qs(&["b", "a", "c"]));
    }

    #[test]
    fn outcome_serialization() {
        let ok = serde_json::to_value(AnswerOutcome::Answer("blue".into())).unwrap();
        assert_eq!(ok, serde_json::json!("blue"));

        let err = PipelineError::GenerationError {
            question: "q".into(),
            detail: "boom".into(),
        };
        let v = serde_json::to_value(AnswerOutcome::failed(&err)).unwrap();
        assert_eq!(v["error"], "GENERATION_ERROR");
        assert!(v["message"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn isolate_marks_only_the_failed_question() {
        let emb = LetterEmbedder::default();
        let index = small_index(&emb).await;
        let generator = EchoGenerator::failing_on("Is fire hot?");
        let cfg = PipelineConfig {
            qa_concurrency: 2,
            ..PipelineConfig::default()
        };
        let questions = qs(&[
            "What color is the sky?",
            "Is water wet?",
            "Is fire hot?",
            "What is blue?",
            "What is wet?",
        ]);

        let sheet = answer_all(&questions, &index, &cfg, &emb, &generator)
            .await
            .unwrap();

        assert_eq!(sheet.len(), 5);
        assert_eq!(sheet.values().filter(|o| o.is_answer()).count(), 4);
        assert!(matches!(
            &sheet["Is fire hot?"],
            AnswerOutcome::Failed { error, .. } if error == "GENERATION_ERROR"
        ));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn fan_out_never_exceeds_concurrency() {
        let emb = LetterEmbedder::default();
        let index = small_index(&emb).await;
        let questions: Vec<String> = (0..12).map(|i| format!("Question {i}?")).collect();

        let generator = SlowGenerator::default();
        let cfg = PipelineConfig {
            qa_concurrency: 3,
            ..PipelineConfig::default()
        };
        let sheet = answer_all(&questions, &index, &cfg, &emb, &generator)
            .await
            .unwrap();
        assert_eq!(sheet.len(), 12);
        assert_eq!(generator.in_flight.peak.load(Ordering::SeqCst), 3);

        // fewer questions than slots: width is the question count
        let generator = SlowGenerator::default();
        let cfg = PipelineConfig {
            qa_concurrency: 8,
            ..PipelineConfig::default()
        };
        answer_all(&questions[..2], &index, &cfg, &emb, &generator)
            .await
            .unwrap();
        assert_eq!(generator.in_flight.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abort_fails_the_whole_batch() {
        let emb = LetterEmbedder::default();
        let index = small_index(&emb).await;
        let generator = EchoGenerator::failing_on("Is fire hot?");
        let cfg = PipelineConfig {
            failure_policy: FailurePolicy::Abort,
            qa_concurrency: 1,
            ..PipelineConfig::default()
        };
        let questions = qs(&[
            "Is fire hot?",
            "What color is the sky?",
            "Is water wet?",
            "What is blue?",
            "What is wet?",
        ]);

        let err = answer_all(&questions, &index, &cfg, &emb, &generator)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "GENERATION_ERROR");
        // sequential fan-out stops at the first failure
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
