//! Typed error for the qa-pipeline crate.

use std::time::Duration;

use thiserror::Error;

/// Every way a question-answering request can fail.
///
/// Caller-fault kinds ([`PipelineError::is_caller_fault`]) are detected before
/// any provider call is made.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Input file content type is neither PDF nor JSON.
    #[error("unsupported file format `{0}`: only application/pdf and application/json are accepted")]
    UnsupportedFormat(String),

    /// PDF could not be parsed or carried no text at all.
    #[error("error extracting text from PDF: {0}")]
    ExtractionError(String),

    /// JSON syntax or shape problem in either upload.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Questions array was empty.
    #[error("no questions found in the provided JSON file")]
    NoQuestions,

    /// Document produced nothing to split.
    #[error("document is empty: nothing to split into chunks")]
    EmptyDocument,

    /// Retrieval returned no chunks for a query.
    #[error("no relevant chunks found for query: {0}")]
    NoRelevantChunks(String),

    /// Language model call failed for one question.
    #[error("error generating answer for question '{question}': {detail}")]
    GenerationError { question: String, detail: String },

    /// Embedding provider failed or returned an unusable vector.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Pipeline knobs violate their constraints.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Request deadline fired before all questions were answered.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PipelineError::ExtractionError(_) => "EXTRACTION_ERROR",
            PipelineError::MalformedInput(_) => "MALFORMED_INPUT",
            PipelineError::NoQuestions => "NO_QUESTIONS",
            PipelineError::EmptyDocument => "EMPTY_DOCUMENT",
            PipelineError::NoRelevantChunks(_) => "NO_RELEVANT_CHUNKS",
            PipelineError::GenerationError { .. } => "GENERATION_ERROR",
            PipelineError::Embedding(_) => "EMBEDDING_ERROR",
            PipelineError::InvalidConfig(_) => "INVALID_CONFIG",
            PipelineError::Timeout(_) => "TIMEOUT",
        }
    }

    /// `true` for problems with what the caller uploaded (HTTP 400 class).
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            PipelineError::UnsupportedFormat(_)
                | PipelineError::MalformedInput(_)
                | PipelineError::NoQuestions
                | PipelineError::EmptyDocument
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_fault_classification() {
        assert!(PipelineError::UnsupportedFormat("text/plain".into()).is_caller_fault());
        assert!(PipelineError::MalformedInput("x".into()).is_caller_fault());
        assert!(PipelineError::NoQuestions.is_caller_fault());
        assert!(PipelineError::EmptyDocument.is_caller_fault());

        assert!(!PipelineError::ExtractionError("x".into()).is_caller_fault());
        assert!(!PipelineError::NoRelevantChunks("q".into()).is_caller_fault());
        assert!(
            !PipelineError::GenerationError {
                question: "q".into(),
                detail: "d".into()
            }
            .is_caller_fault()
        );
        assert!(!PipelineError::Timeout(Duration::from_secs(1)).is_caller_fault());
    }

    #[test]
    fn messages_keep_detail() {
        let e = PipelineError::GenerationError {
            question: "Why?".into(),
            detail: "HTTP 503".into(),
        };
        assert_eq!(e.code(), "GENERATION_ERROR");
        assert!(e.to_string().contains("Why?"));
        assert!(e.to_string().contains("HTTP 503"));
    }
}
