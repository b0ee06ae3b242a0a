use anyhow::Result;
use std::collections::HashMap;

/// Environment-driven configuration for the generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl LlmSettings {
    const PROVIDER_ENV: &'static str = "DENTICHECK_LLM_PROVIDER";
    const ENDPOINT_ENV: &'static str = "DENTICHECK_LLM_ENDPOINT";
    const MODEL_ENV: &'static str = "DENTICHECK_LLM_MODEL";
    const TIMEOUT_ENV: &'static str = "DENTICHECK_LLM_TIMEOUT_SECS";

    const DEFAULT_ENDPOINT: &'static str = "http://localhost:11434";
    const DEFAULT_MODEL: &'static str = "llama3.1:latest";
    const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Load settings from environment variables.
    ///
    /// * `DENTICHECK_LLM_PROVIDER` — `ollama` (default) or `noop`.
    /// * `DENTICHECK_LLM_ENDPOINT` — Ollama base URL (default local daemon).
    /// * `DENTICHECK_LLM_MODEL`    — model tag served by Ollama.
    /// * `DENTICHECK_LLM_TIMEOUT_SECS` — request timeout in seconds.
    pub fn from_env() -> Result<Self> {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        let pick = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let provider = pick(Self::PROVIDER_ENV)
            .unwrap_or_else(|| "ollama".to_string())
            .to_lowercase();
        let endpoint = pick(Self::ENDPOINT_ENV).unwrap_or_else(|| Self::DEFAULT_ENDPOINT.to_string());
        let model = pick(Self::MODEL_ENV).unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());
        let timeout_secs = pick(Self::TIMEOUT_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            provider,
            endpoint,
            model,
            timeout_secs,
        })
    }
}
