pub mod decision;
pub mod llm;
pub mod report;
pub mod retrieval;

pub use decision::{
    rules::{build_knowledge_query, evaluate_overall_risk},
    ActionPriority, ClassSummary, DecisionMeta, DecisionRecord, DetectionSummary, GateResult,
    GateStatus, MlResult, OverallResult, RecommendedAction, RecordValidationError, RiskLevel,
    SurveyResult,
};
pub use llm::{GenerationClient, LlmSettings, NoopGenerationClient, OllamaClient};
pub use report::{
    parser::{parse_report, ReportMarkers},
    Language, ReportConfig, ReportError, ReportResponse, ReportService, StructuredReport,
};
pub use retrieval::{
    http::HttpVectorSearch, RetrievalConfig, RetrievedSnippet, Retriever, SearchHit, VectorSearch,
};
