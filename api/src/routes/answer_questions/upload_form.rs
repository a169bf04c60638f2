//! Multipart form for `POST /answer-questions`.

use axum::extract::Multipart;
use qa_pipeline::QaRequest;
use tracing::debug;

use crate::error_handler::{AppError, AppResult};

pub const QUESTIONS_FIELD: &str = "questions_file";
pub const INPUT_FIELD: &str = "input_file";

/// Reads both upload fields into a [`QaRequest`].
///
/// The input file's part content type is passed through untouched; when the
/// part declares none, it is guessed from the file name extension. Unknown
/// fields are ignored.
pub async fn read_upload(mut multipart: Multipart) -> AppResult<QaRequest> {
    let mut questions = None;
    let mut input = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            QUESTIONS_FIELD => {
                questions = Some(field.bytes().await?.to_vec());
            }
            INPUT_FIELD => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| field.file_name().and_then(guess_content_type))
                    .unwrap_or_default();
                let bytes = field.bytes().await?.to_vec();
                input = Some((content_type, bytes));
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let questions = questions
        .ok_or_else(|| AppError::malformed(format!("missing multipart field `{QUESTIONS_FIELD}`")))?;
    let (content_type, document) =
        input.ok_or_else(|| AppError::malformed(format!("missing multipart field `{INPUT_FIELD}`")))?;

    Ok(QaRequest {
        questions,
        document,
        content_type,
    })
}

fn guess_content_type(file_name: &str) -> Option<String> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("application/pdf".into()),
        "json" => Some("application/json".into()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_from_extension() {
        assert_eq!(guess_content_type("report.PDF").as_deref(), Some("application/pdf"));
        assert_eq!(guess_content_type("data.json").as_deref(), Some("application/json"));
        assert_eq!(guess_content_type("notes.txt"), None);
        assert_eq!(guess_content_type("README"), None);
    }
}
