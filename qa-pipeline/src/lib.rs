//! Question answering over a single uploaded document.
//!
//! Flow for one request:
//! 1) validate the declared content type and parse the questions
//! 2) load the document as text ([`loader`])
//! 3) split into overlapping chunks ([`chunker`])
//! 4) embed every chunk once into a [`SimilarityIndex`]
//! 5) answer all distinct questions with a bounded fan-out ([`orchestrator`])
//!
//! Provider clients come in through the [`EmbeddingsProvider`] and
//! [`Generator`] traits and are shared across requests; everything built for a
//! request is dropped when it ends.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::LlmServiceProfiles;
//! use qa_pipeline::{PipelineConfig, QaPipeline, QaRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//! let pipeline = QaPipeline::from_services(PipelineConfig::from_env()?, svc)?;
//! let sheet = pipeline
//!     .run(QaRequest {
//!         questions: br#"["What color is the sky?"]"#.to_vec(),
//!         document: br#"{"sky":"blue"}"#.to_vec(),
//!         content_type: "application/json".into(),
//!     })
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&sheet)?);
//! # Ok(()) }
//! ```

pub mod answer;
pub mod cfg;
pub mod chunker;
pub mod embed;
pub mod error;
pub mod index;
pub mod loader;
pub mod orchestrator;
pub mod stage;

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use tracing::{info, instrument, warn};

pub use answer::{Generator, service::ServiceGenerator};
pub use cfg::{FailurePolicy, PipelineConfig};
pub use embed::{EmbeddingsProvider, service::ServiceEmbedder};
pub use error::PipelineError;
pub use index::SimilarityIndex;
pub use orchestrator::{AnswerOutcome, AnswerSheet};

use crate::{loader::DocumentKind, stage::StageTracker};

/// Raw uploads for one request.
#[derive(Debug, Clone)]
pub struct QaRequest {
    /// JSON array of question strings.
    pub questions: Vec<u8>,
    /// PDF or JSON bytes.
    pub document: Vec<u8>,
    /// Declared content type of `document`.
    pub content_type: String,
}

/// Request-scoped pipeline runner with process-wide provider clients.
#[derive(Clone)]
pub struct QaPipeline {
    cfg: PipelineConfig,
    embedder: Arc<dyn EmbeddingsProvider>,
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for QaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline").field("cfg", &self.cfg).finish_non_exhaustive()
    }
}

impl QaPipeline {
    /// # Errors
    /// [`PipelineError::InvalidConfig`] if `cfg` does not validate.
    pub fn new(
        cfg: PipelineConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, PipelineError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            embedder,
            generator,
        })
    }

    /// Wires both traits to the shared [`LlmServiceProfiles`].
    pub fn from_services(
        cfg: PipelineConfig,
        svc: Arc<LlmServiceProfiles>,
    ) -> Result<Self, PipelineError> {
        let embedder = Arc::new(ServiceEmbedder::new(svc.clone(), cfg.embedding_dim));
        let generator = Arc::new(ServiceGenerator::new(svc));
        Self::new(cfg, embedder, generator)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Runs the whole pipeline under the configured request deadline.
    ///
    /// Dropping the returned future cancels every outstanding question.
    /// Document loading and chunking run on the blocking pool, so the deadline
    /// also covers them; a timed-out blocking task finishes in the background
    /// and its result is discarded.
    ///
    /// # Errors
    /// Any [`PipelineError`]; caller-input problems are reported before any
    /// provider call is made.
    #[instrument(skip_all, fields(content_type = %req.content_type, document_bytes = req.document.len()))]
    pub async fn run(&self, req: QaRequest) -> Result<AnswerSheet, PipelineError> {
        self.run_tracked(&mut StageTracker::new(), req).await
    }

    /// The tracker outlives the timed future, so a deadline still ends in
    /// `Failed(TIMEOUT)`.
    async fn run_tracked(
        &self,
        tracker: &mut StageTracker,
        req: QaRequest,
    ) -> Result<AnswerSheet, PipelineError> {
        let res = match self.cfg.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run_stages(tracker, req)).await
            {
                Ok(res) => res,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis(), "request deadline reached");
                    Err(PipelineError::Timeout(limit))
                }
            },
            None => self.run_stages(tracker, req).await,
        };
        if let Err(err) = &res {
            tracker.fail(err);
        }
        res
    }

    async fn run_stages(
        &self,
        tracker: &mut StageTracker,
        req: QaRequest,
    ) -> Result<AnswerSheet, PipelineError> {
        // Cheap caller-input checks first.
        let kind = DocumentKind::from_content_type(&req.content_type)?;
        let questions = loader::load_questions(&req.questions)?;
        if questions.is_empty() {
            return Err(PipelineError::NoQuestions);
        }

        let document = req.document;
        let text = offload("document loading", move || {
            loader::load_document(&document, kind)
        })
        .await?;
        tracker.advance();

        let questions = orchestrator::distinct_questions(questions);
        info!(distinct = questions.len(), "questions loaded");
        tracker.advance();

        let (size, overlap) = (self.cfg.chunk_size, self.cfg.chunk_overlap);
        let chunks = offload("chunking", move || chunker::split_text(&text, size, overlap)).await?;
        tracker.advance();

        let index =
            SimilarityIndex::build(chunks, self.embedder.as_ref(), self.cfg.embed_concurrency)
                .await?;
        tracker.advance();

        let sheet = orchestrator::answer_all(
            &questions,
            &index,
            &self.cfg,
            self.embedder.as_ref(),
            self.generator.as_ref(),
        )
        .await?;
        tracker.advance();

        Ok(sheet)
    }
}

/// Runs CPU-bound document work on the blocking pool.
async fn offload<T, F>(what: &'static str, work: F) -> Result<T, PipelineError>
where
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::ExtractionError(format!("{what} task failed: {e}")))?
}
