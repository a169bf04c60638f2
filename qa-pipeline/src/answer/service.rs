//! Generator backed by the shared LLM service profiles.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use tracing::error;

use crate::answer::Generator;

/// Calls the `generation` profile of [`LlmServiceProfiles`].
#[derive(Debug, Clone)]
pub struct ServiceGenerator {
    svc: Arc<LlmServiceProfiles>,
}

impl ServiceGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl Generator for ServiceGenerator {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>> {
        Box::pin(async move {
            self.svc.generate(prompt, Some(system)).await.map_err(|e| {
                error!(error = %e, timeout = e.is_timeout(), "generation call failed");
                e.to_string()
            })
        })
    }
}
