use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::decision::{rules, DecisionRecord, RecordValidationError};
use crate::llm::GenerationClient;
use crate::retrieval::{RetrievalConfig, Retriever, VectorSearch};

pub mod context;
pub mod parser;
pub mod prompts;

use parser::ReportMarkers;

/// Report output language selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ko" => Ok(Language::Ko),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language `{other}` (expected ko|en)")),
        }
    }
}

/// Decoded three-field report. All fields are always populated strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredReport {
    pub summary: String,
    pub details: String,
    pub disclaimer: String,
}

/// Caller-facing response payload for one report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub summary: String,
    pub details: String,
    pub disclaimer: String,
    pub language: Language,
}

/// Failures surfaced to the caller. Retrieval problems never appear here;
/// they degrade inside the pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("decision record failed validation")]
    InvalidRecord(#[from] RecordValidationError),
    #[error("report generation failed")]
    Generation(#[source] anyhow::Error),
    #[error("report generation timed out after {0:?}")]
    GenerationTimeout(Duration),
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub retrieval: RetrievalConfig,
    pub generation_timeout: Duration,
    pub markers: ReportMarkers,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            generation_timeout: Duration::from_secs(90),
            markers: ReportMarkers::default(),
        }
    }
}

/// One-request orchestration: evaluate, retrieve, format, generate, parse.
///
/// Collaborator lifecycles (connect/close) belong to the surrounding service
/// shell; this type only borrows them through `Arc`.
pub struct ReportService<S: VectorSearch + ?Sized, G: GenerationClient + ?Sized> {
    retriever: Retriever<S>,
    generator: Arc<G>,
    config: ReportConfig,
}

impl<S: VectorSearch + ?Sized, G: GenerationClient + ?Sized> ReportService<S, G> {
    pub fn new(search: Arc<S>, generator: Arc<G>, config: ReportConfig) -> Self {
        Self {
            retriever: Retriever::new(search, config.retrieval.clone()),
            generator,
            config,
        }
    }

    /// Generate a structured report for one screening session.
    ///
    /// The record passes through the rule engine exactly once; a caller that
    /// already evaluated it keeps its verdict.
    #[instrument(
        name = "generate_report",
        skip(self, record),
        fields(session_id = %record.meta.session_id, language = ?language)
    )]
    pub async fn generate(
        &self,
        mut record: DecisionRecord,
        language: Language,
    ) -> Result<ReportResponse, ReportError> {
        record.validate()?;
        if record.overall.is_none() {
            record.overall = Some(rules::evaluate_overall_risk(&record));
        }

        let query = rules::build_knowledge_query(&record.detection);
        let snippets = self.retriever.retrieve(&query).await;
        debug!(snippets = snippets.len(), %query, "knowledge retrieval done");

        let prompt_context = context::format_context(&record, &snippets);
        let system_prompt = prompts::system_persona(language);
        let user_prompt = prompts::report_prompt(&prompt_context, language, &self.config.markers);

        let completion = self.generator.complete(&system_prompt, &user_prompt);
        let raw = match tokio::time::timeout(self.config.generation_timeout, completion).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                warn!(error = %err, "generation collaborator failed");
                return Err(ReportError::Generation(err));
            }
            Err(_) => {
                warn!(timeout = ?self.config.generation_timeout, "generation timed out");
                return Err(ReportError::GenerationTimeout(self.config.generation_timeout));
            }
        };

        let report = parser::parse_with_markers(&raw, &self.config.markers);
        Ok(ReportResponse {
            summary: report.summary,
            details: report.details,
            disclaimer: report.disclaimer,
            language,
        })
    }
}
