//! Turns uploaded bytes into a plain-text document and a question list.

use std::collections::BTreeMap;

use lopdf::{Document, Encoding, Object, ObjectId, content::Content};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Json,
}

impl DocumentKind {
    /// Maps a declared content type to a kind.
    ///
    /// Parameters such as `; charset=utf-8` are ignored and the comparison is
    /// case-insensitive.
    pub fn from_content_type(content_type: &str) -> Result<Self, PipelineError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "application/json" => Ok(Self::Json),
            _ => Err(PipelineError::UnsupportedFormat(content_type.to_string())),
        }
    }
}

/// Flattens a document of the given kind into text.
pub fn load_document(bytes: &[u8], kind: DocumentKind) -> Result<String, PipelineError> {
    match kind {
        DocumentKind::Pdf => extract_pdf_text(bytes),
        DocumentKind::Json => json_as_text(bytes),
    }
}

/// Extracts text page by page and joins the non-empty pages with newlines.
///
/// The page tree is walked once. Pages whose text cannot be decoded are
/// skipped. A PDF with no text at all (image-only scan, empty pages) is an
/// [`PipelineError::ExtractionError`].
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| PipelineError::ExtractionError(format!("failed to load PDF: {e}")))?;

    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for (page_no, page_id) in &pages {
        match page_text(&doc, *page_id) {
            Ok(text) if !text.trim().is_empty() => texts.push(text),
            Ok(_) => debug!(page = page_no, "page has no text"),
            Err(e) => warn!(page = page_no, error = %e, "skipping unreadable page"),
        }
    }

    if texts.is_empty() {
        return Err(PipelineError::ExtractionError(format!(
            "no extractable text in {} page(s)",
            pages.len()
        )));
    }

    debug!(pages = pages.len(), text_pages = texts.len(), "PDF text extracted");
    Ok(texts.join("\n"))
}

/// Text shown by `Tj`/`TJ` operators on one page, one line per text object.
fn page_text(doc: &Document, page_id: ObjectId) -> lopdf::Result<String> {
    let encodings = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(name, font)| font.get_font_encoding(doc).map(|enc| (name, enc)))
        .collect::<lopdf::Result<BTreeMap<Vec<u8>, Encoding>>>()?;
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut text = String::new();
    let mut encoding = None;
    for op in &content.operations {
        match op.operator.as_str() {
            "Tf" => {
                let font = op
                    .operands
                    .first()
                    .ok_or_else(|| lopdf::Error::Syntax("missing font operand".into()))?
                    .as_name()?;
                encoding = encodings.get(font);
            }
            "Tj" | "TJ" => match encoding {
                Some(enc) => push_shown_text(&mut text, enc, &op.operands)?,
                None => debug!("text shown without a selected font"),
            },
            "ET" if !text.ends_with('\n') => text.push('\n'),
            _ => {}
        }
    }
    Ok(text)
}

fn push_shown_text(text: &mut String, enc: &Encoding, operands: &[Object]) -> lopdf::Result<()> {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(enc, bytes)?),
            Object::Array(items) => {
                push_shown_text(text, enc, items)?;
                text.push(' ');
            }
            // large negative kerning reads as a word gap
            Object::Integer(i) if *i < -100 => text.push(' '),
            _ => {}
        }
    }
    Ok(())
}

/// Parses JSON and re-serializes it as indented text.
pub fn json_as_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| PipelineError::MalformedInput(format!("input file is not valid JSON: {e}")))?;

    serde_json::to_string_pretty(&value)
        .map_err(|e| PipelineError::MalformedInput(format!("cannot render JSON as text: {e}")))
}

/// Parses a JSON array of strings, keeping order and duplicates.
///
/// An empty array is returned as-is; rejecting it is up to the caller.
pub fn load_questions(bytes: &[u8]) -> Result<Vec<String>, PipelineError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        PipelineError::MalformedInput(format!("questions file is not valid JSON: {e}"))
    })?;

    let Value::Array(items) = value else {
        return Err(PipelineError::MalformedInput(
            "questions file must be a JSON array of strings".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(q) => Ok(q),
            other => Err(PipelineError::MalformedInput(format!(
                "question #{i} is not a string: {other}"
            ))),
        })
        .collect()
}
