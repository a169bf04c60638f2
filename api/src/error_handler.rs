use ai_llm_service::AiLlmError;
use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qa_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("invalid server configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Http { status, .. } => *status,
            // startup-only
            AppError::Config(_) | AppError::Llm(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::Http { code, .. } => code,
        }
    }

    /// 400 with `MALFORMED_INPUT`, for problems in the multipart envelope itself.
    pub fn malformed(message: impl Into<String>) -> Self {
        AppError::Http {
            status: StatusCode::BAD_REQUEST,
            code: "MALFORMED_INPUT",
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Caller-fault kinds become 400, everything else 500.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = if err.is_caller_fault() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError::Http {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Oversized uploads keep their 413, any other multipart failure is malformed input.
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::Http {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                code: "PAYLOAD_TOO_LARGE",
                message: err.body_text(),
            }
        } else {
            AppError::malformed(format!("unreadable multipart body: {}", err.body_text()))
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        AppError::malformed(format!("expected a multipart/form-data upload: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_status() {
        let e: AppError = PipelineError::UnsupportedFormat("text/plain".into()).into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(e.error_code(), "UNSUPPORTED_FORMAT");

        let e: AppError = PipelineError::NoQuestions.into();
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);

        let e: AppError = PipelineError::ExtractionError("no text".into()).into();
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.error_code(), "EXTRACTION_ERROR");
        assert!(e.to_string().contains("no text"));
    }
}
