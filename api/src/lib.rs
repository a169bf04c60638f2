use std::sync::Arc;

pub mod core;
pub mod error_handler;
mod routes;

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::app_state::{AppState, ServerConfig},
    error_handler::AppError,
    routes::answer_questions::answer_questions_route::answer_questions,
};

/// Reads config from the environment, builds the LLM clients once and serves
/// until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let server = ServerConfig::from_env()?;
    let state = Arc::new(AppState::from_env()?);
    let app = router(state, server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&server.address)
        .await
        .map_err(AppError::Bind)?;
    info!(
        address = %server.address,
        max_upload_bytes = server.max_upload_bytes,
        "docqa backend listening"
    );

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// All routes with shared state and the upload size limit.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/answer-questions", post(answer_questions))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
