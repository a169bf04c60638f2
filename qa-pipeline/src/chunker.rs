//! Recursive character splitter with exact overlap.
//!
//! Sizes are counted in `char`s. Each cut lands right after the coarsest
//! separator found in the window (paragraph, line, sentence, word) and falls
//! back to a hard cut only when no separator fits. The next chunk always
//! starts `overlap` characters before the previous cut, so consecutive chunks
//! share exactly `overlap` characters and the text reconstructs losslessly.

use tracing::debug;

use crate::error::PipelineError;

/// Separators in decreasing granularity.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", " "];

/// Contiguous span of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence; stable within a request.
    pub index: usize,
    /// Offset of the first character in the document, in chars.
    pub start: usize,
    pub text: String,
}

/// Splits `text` into chunks of at most `size` chars overlapping by `overlap`.
///
/// # Errors
/// - [`PipelineError::InvalidConfig`] unless `size > overlap`
/// - [`PipelineError::EmptyDocument`] for empty or whitespace-only text
pub fn split_text(text: &str, size: usize, overlap: usize) -> Result<Vec<Chunk>, PipelineError> {
    if size == 0 || overlap >= size {
        return Err(PipelineError::InvalidConfig(format!(
            "chunk size ({size}) must be greater than overlap ({overlap})"
        )));
    }
    if text.trim().is_empty() {
        return Err(PipelineError::EmptyDocument);
    }

    let chars: Vec<char> = text.chars().collect();
    let separators: Vec<Vec<char>> = SEPARATORS.iter().map(|s| s.chars().collect()).collect();

    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        if chars.len() - start <= size {
            chunks.push(make_chunk(chunks.len(), &chars, start, chars.len()));
            break;
        }

        let hard_end = start + size;
        let end = separators
            .iter()
            .find_map(|sep| last_cut_after(&chars, sep, start, start + overlap, hard_end))
            .unwrap_or(hard_end);

        chunks.push(make_chunk(chunks.len(), &chars, start, end));
        start = end - overlap;
    }

    debug!(
        chars = chars.len(),
        chunks = chunks.len(),
        size,
        overlap,
        "document split"
    );
    Ok(chunks)
}

/// Largest `p` in `(floor, ceil]` such that `sep` ends at `p` and begins at or after `start`.
fn last_cut_after(
    chars: &[char],
    sep: &[char],
    start: usize,
    floor: usize,
    ceil: usize,
) -> Option<usize> {
    (floor + 1..=ceil)
        .rev()
        .filter(|&p| p >= start + sep.len())
        .find(|&p| chars[p - sep.len()..p] == *sep)
}

fn make_chunk(index: usize, chars: &[char], start: usize, end: usize) -> Chunk {
    Chunk {
        index,
        start,
        text: chars[start..end].iter().collect(),
    }
}
