use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use qa_pipeline::{PipelineConfig, QaPipeline};
use tracing::info;

use crate::error_handler::AppError;

/// Default upload ceiling for the whole multipart body (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` to bind, from `API_ADDRESS`.
    pub address: String,
    /// Multipart body limit, from `MAX_UPLOAD_BYTES`.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|k| std::env::var(k).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("API_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0:8000".into());

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) if !v.trim().is_empty() => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::Config(format!("MAX_UPLOAD_BYTES=`{v}` is not a positive integer")))?,
            _ => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            address,
            max_upload_bytes,
        })
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Pipeline runner holding the process-wide provider clients.
    pub pipeline: QaPipeline,
}

impl AppState {
    pub fn new(pipeline: QaPipeline) -> Self {
        Self { pipeline }
    }

    /// Builds LLM clients and pipeline knobs from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        let svc = Arc::new(LlmServiceProfiles::from_env()?);
        let cfg = PipelineConfig::from_env()?;
        info!(
            chunk_size = cfg.chunk_size,
            chunk_overlap = cfg.chunk_overlap,
            top_k = cfg.top_k,
            qa_concurrency = cfg.qa_concurrency,
            embed_concurrency = cfg.embed_concurrency,
            policy = ?cfg.failure_policy,
            "pipeline configured"
        );
        Ok(Self::new(QaPipeline::from_services(cfg, svc)?))
    }
}
