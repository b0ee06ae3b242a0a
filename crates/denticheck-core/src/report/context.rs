//! Serialization of a decision record plus retrieved knowledge into one
//! prompt-ready text block. Sections with no source data are omitted
//! entirely; a header is never emitted without a body.

use serde_json::Value;

use crate::decision::DecisionRecord;
use crate::retrieval::RetrievedSnippet;

const SNIPPET_DELIMITER: &str = "---";

/// Build the prompt context in fixed section order: knowledge, detection
/// summary, survey, history, overall verdict.
pub fn format_context(record: &DecisionRecord, snippets: &[RetrievedSnippet]) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !snippets.is_empty() {
        let mut block = String::from("[Retrieved Knowledge]\n");
        let rendered: Vec<String> = snippets
            .iter()
            .map(|snippet| {
                format!(
                    "[source: {}] (confidence: {:.1}%)\n{}",
                    snippet.title, snippet.confidence_pct, snippet.content
                )
            })
            .collect();
        block.push_str(&rendered.join(&format!("\n\n{SNIPPET_DELIMITER}\n\n")));
        sections.push(block);
    }

    if !record.detection.is_empty() {
        let mut block = String::from("[Detection Summary]");
        for (label, class) in record.detection.iter() {
            if class.present {
                block.push_str(&format!(
                    "\n- {}: {} found (max confidence {:.2}, area ratio {:.3})",
                    label, class.count, class.max_score, class.area_ratio
                ));
            } else {
                block.push_str(&format!("\n- {label}: not found"));
            }
        }
        sections.push(block);
    }

    if let Some(ml) = &record.ml {
        let mut block = String::from("[Classifier Screening]");
        for (condition, score) in [("gingivitis", &ml.gingivitis), ("periodontal", &ml.periodontal)]
        {
            let status = if score.suspect { "suspect" } else { "normal" };
            block.push_str(&format!(
                "\n- {}: {} (probability {:.2}, threshold {:.2})",
                condition, status, score.prob, score.threshold
            ));
        }
        sections.push(block);
    }

    if let Some(survey) = &record.survey {
        if !survey.answers.is_empty() || survey.risk_score.is_some() {
            let mut block = String::from("[Survey Answers]");
            for (question, answer) in &survey.answers {
                block.push_str(&format!("\n- {}: {}", question, render_value(answer)));
            }
            if let Some(score) = survey.risk_score {
                block.push_str(&format!("\n- derived risk score: {score:.2}"));
            }
            sections.push(block);
        }
    }

    if let Some(history) = &record.history {
        if !history.is_empty() {
            let mut block = String::from("[Changes Since Last Session]");
            for (key, delta) in history {
                block.push_str(&format!("\n- {key}: {delta}"));
            }
            sections.push(block);
        }
    }

    if let Some(overall) = &record.overall {
        let mut block = String::from("[Overall Assessment]");
        block.push_str(&format!("\n- risk level: {}", overall.level));
        if !overall.recommended_actions.is_empty() {
            let codes: Vec<&str> = overall
                .recommended_actions
                .iter()
                .map(|action| action.code.as_str())
                .collect();
            block.push_str(&format!("\n- recommended action codes: {}", codes.join(", ")));
        }
        sections.push(block);
    }

    sections.join("\n\n")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
