//! "Stuff" question-answering prompt: every retrieved chunk goes into one prompt.

use crate::index::ScoredChunk;

/// System message sent with every answer request.
pub const DEFAULT_SYSTEM: &str = "You answer questions about a single document. \
Use only the provided context. If the answer is not in the context, say that you don't know.";

const PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Builds the user prompt: preamble, chunk texts separated by blank lines, then the question.
///
/// Chunks keep their ranking order.
///
/// # Example
/// ```
/// # use qa_pipeline::answer::prompt::build_user_prompt;
/// let prompt = build_user_prompt("What color is the sky?", &[]);
/// assert!(prompt.ends_with("Question: What color is the sky?\nHelpful Answer:"));
/// ```
pub fn build_user_prompt(question: &str, hits: &[ScoredChunk<'_>]) -> String {
    let context = hits
        .iter()
        .map(|h| h.chunk.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{PREAMBLE}\n\n{context}\n\nQuestion: {}\nHelpful Answer:",
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunk;

    #[test]
    fn context_is_joined_in_rank_order() {
        let a = Chunk {
            index: 3,
            start: 0,
            text: " The sky is blue. ".into(),
        };
        let b = Chunk {
            index: 1,
            start: 0,
            text: "Water is wet.".into(),
        };
        let hits = [
            ScoredChunk { chunk: &a, score: 0.9 },
            ScoredChunk { chunk: &b, score: 0.2 },
        ];

        let prompt = build_user_prompt("  What color is the sky? ", &hits);
        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.contains("The sky is blue.\n\nWater is wet."));
        assert!(prompt.ends_with("Question: What color is the sky?\nHelpful Answer:"));
    }
}
