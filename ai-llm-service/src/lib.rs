//! Shared LLM access for the document QA service.
//!
//! One [`service_profiles::LlmServiceProfiles`] is built at process start and
//! handed to every consumer behind an `Arc`. It owns one client for text
//! generation and one for embeddings; both talk to either Ollama or OpenAI.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use service_profiles::LlmServiceProfiles;
