mod ollama;
mod settings;

use anyhow::Result;
use async_trait::async_trait;

pub use ollama::OllamaClient;
pub use settings::LlmSettings;

/// Client abstraction for the generative model that writes the report text.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Produce a completion for the given system and user prompts.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Offline placeholder that emits a correctly tagged degraded report.
#[derive(Debug, Default, Clone)]
pub struct NoopGenerationClient;

#[async_trait]
impl GenerationClient for NoopGenerationClient {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Ok("SUMMARY: Report generation is running in offline mode.\n\n\
            DETAILS: No language model is configured, so only the rule-based screening \
            verdict is available. Review the detection summary and recommended actions \
            directly.\n\n\
            DISCLAIMER: This output is informational only and does not replace an \
            examination by a licensed dentist."
            .to_string())
    }
}
