use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use denticheck_core::{
    evaluate_overall_risk, parse_report, DecisionRecord, GenerationClient, HttpVectorSearch,
    Language, LlmSettings, NoopGenerationClient, OllamaClient, OverallResult, ReportConfig,
    ReportService, VectorSearch,
};
use tracing_subscriber::EnvFilter;

const SEARCH_ENDPOINT_ENV: &str = "DENTICHECK_SEARCH_ENDPOINT";

#[derive(Parser, Debug)]
#[command(
    name = "denticheck",
    author,
    version,
    about = "Dental screening decision & report pipeline CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the rule engine over a decision record JSON document
    Evaluate {
        /// Path to the decision record JSON file
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
        /// Emit the verdict as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Decode a raw model response into the three-field report
    ParseReport {
        /// Response text file; reads stdin when omitted
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Emit the decoded report as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Generate a full report against the configured collaborators
    Generate {
        /// Path to the decision record JSON file
        #[arg(long, value_name = "FILE")]
        record: PathBuf,
        /// Report language (ko|en)
        #[arg(long, default_value = "en")]
        language: Language,
        /// Skip the language model and emit the offline placeholder report
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate { record, json } => evaluate(&record, json),
        Commands::ParseReport { input, json } => parse_response(input.as_deref(), json),
        Commands::Generate {
            record,
            language,
            offline,
        } => generate(&record, language, offline).await,
    }
}

fn load_record(path: &Path) -> Result<DecisionRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read decision record at {}", path.display()))?;
    let record: DecisionRecord = serde_json::from_str(&raw)
        .with_context(|| format!("invalid decision record JSON at {}", path.display()))?;
    record.validate()?;
    Ok(record)
}

fn evaluate(path: &Path, json: bool) -> Result<()> {
    let record = load_record(path)?;
    let result = evaluate_overall_risk(&record);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    print_verdict(&result);
    Ok(())
}

fn print_verdict(result: &OverallResult) {
    println!("Risk level: {}", result.level);
    if result.reasons.is_empty() {
        println!("No rule fired.");
    } else {
        println!("Reasons:");
        for reason in &result.reasons {
            println!("  - {reason}");
        }
    }
    println!("Recommended actions:");
    for action in &result.recommended_actions {
        println!("  - {} [{:?}]", action.code, action.priority);
    }
    for (flag, value) in &result.safety_flags {
        if *value {
            println!("Safety flag set: {flag}");
        }
    }
}

fn parse_response(input: Option<&Path>, json: bool) -> Result<()> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read response text at {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read response text from stdin")?;
            buffer
        }
    };
    let report = parse_report(&raw);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("Summary: {}", report.summary);
    println!("Details: {}", report.details);
    println!("Disclaimer: {}", report.disclaimer);
    Ok(())
}

async fn generate(path: &Path, language: Language, offline: bool) -> Result<()> {
    let record = load_record(path)?;
    let config = ReportConfig::default();

    let search_endpoint = std::env::var(SEARCH_ENDPOINT_ENV)
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let search: Arc<dyn VectorSearch> = Arc::new(HttpVectorSearch::new(
        &search_endpoint,
        config.retrieval.timeout + Duration::from_secs(1),
    )?);

    let generator: Arc<dyn GenerationClient> = if offline {
        Arc::new(NoopGenerationClient)
    } else {
        let settings = LlmSettings::from_env()?;
        match settings.provider.as_str() {
            "noop" => Arc::new(NoopGenerationClient),
            _ => Arc::new(OllamaClient::new(&settings)?),
        }
    };

    let service = ReportService::new(search, generator, config);
    let response = service
        .generate(record, language)
        .await
        .context("report generation failed")?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
