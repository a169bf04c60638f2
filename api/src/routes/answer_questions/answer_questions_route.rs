//! POST /answer-questions: answers a batch of questions about one uploaded document.

use std::{sync::Arc, time::Instant};

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use qa_pipeline::AnswerSheet;
use tracing::{error, info, warn};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::answer_questions::upload_form::read_upload,
};

/// Handler: POST /answer-questions
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/answer-questions \
///   -F 'questions_file=@questions.json;type=application/json' \
///   -F 'input_file=@handbook.pdf;type=application/pdf'
/// ```
pub async fn answer_questions(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AnswerSheet>> {
    let started = Instant::now();
    let req = read_upload(multipart?).await?;
    info!(
        content_type = %req.content_type,
        document_bytes = req.document.len(),
        questions_bytes = req.questions.len(),
        "answer-questions request"
    );

    match state.pipeline.run(req).await {
        Ok(sheet) => {
            info!(
                answers = sheet.len(),
                latency_ms = started.elapsed().as_millis(),
                "answer-questions completed"
            );
            Ok(Json(sheet))
        }
        Err(err) => {
            if err.is_caller_fault() {
                warn!(code = err.code(), error = %err, "answer-questions rejected");
            } else {
                error!(code = err.code(), error = %err, "answer-questions failed");
            }
            Err(AppError::from(err))
        }
    }
}
