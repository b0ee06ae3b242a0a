//! Deterministic risk evaluation over a decision record.
//!
//! Rules run in a fixed order and only ever escalate the level: lesion first,
//! then the classifier branch, then tartar, then caries. Reasons and actions
//! preserve evaluation order so the audit trail mirrors the rule sequence.

use std::collections::BTreeMap;

use tracing::debug;

use super::{
    labels, ActionPriority, DecisionRecord, DetectionSummary, OverallResult, RecommendedAction,
    RiskLevel,
};

/// Safety flag consumed verbatim by downstream report generation.
pub const LESION_CAUTION_FLAG: &str = "lesion_caution_text_required";

/// Knowledge query used when no finding is present.
pub const WELLNESS_QUERY: &str = "general oral health maintenance";

const CARIES_VISIT_COUNT: u32 = 3;

/// Evaluate the overall risk for one screening session.
///
/// Pure and total: missing optional sections count as "no evidence", never as
/// errors. The returned level is the monotonic maximum over all fired rules.
pub fn evaluate_overall_risk(record: &DecisionRecord) -> OverallResult {
    let mut level = RiskLevel::Normal;
    let mut reasons: Vec<String> = Vec::new();
    let mut actions: Vec<RecommendedAction> = Vec::new();
    let mut safety_flags = BTreeMap::new();
    safety_flags.insert(LESION_CAUTION_FLAG.to_string(), false);

    // Lesion takes precedence over everything else.
    if record.detection.is_present(labels::LESION) {
        reasons.push("lesion_detected".to_string());
        level = RiskLevel::RecommendVisit;
        safety_flags.insert(LESION_CAUTION_FLAG.to_string(), true);
        actions.push(RecommendedAction::new(
            "hospital_visit_lesion",
            ActionPriority::High,
        ));
    }

    // Classifier branch: periodontal escalation wins over the gingivitis
    // advisory for the same record.
    if let Some(ml) = &record.ml {
        if ml.periodontal.prob > ml.periodontal.threshold {
            reasons.push("periodontal_high_risk".to_string());
            level = level.max(RiskLevel::RecommendVisit);
            actions.push(RecommendedAction::new(
                "hospital_visit_periodontal",
                ActionPriority::High,
            ));
        } else if ml.gingivitis.suspect {
            reasons.push("gingivitis_suspect".to_string());
            level = level.max(RiskLevel::Attention);
            actions.push(RecommendedAction::new(
                "gum_care_routine",
                ActionPriority::Medium,
            ));
        }
    }

    if record.detection.is_present(labels::TARTAR) {
        reasons.push("calculus_present".to_string());
        level = level.max(RiskLevel::Attention);
        actions.push(RecommendedAction::new(
            "scaling_consult",
            ActionPriority::Medium,
        ));
    }

    if let Some(caries) = record.detection.get(labels::CARIES) {
        if caries.present {
            reasons.push("caries_detected".to_string());
            level = level.max(RiskLevel::Attention);
            if caries.count >= CARIES_VISIT_COUNT {
                level = level.max(RiskLevel::RecommendVisit);
            }
            actions.push(RecommendedAction::new("cavity_care", ActionPriority::Medium));
        }
    }

    // A clean record still gets exactly one maintenance action.
    if level == RiskLevel::Normal {
        actions.push(RecommendedAction::new(
            "maintain_routine",
            ActionPriority::Low,
        ));
    }

    debug!(?level, reasons = reasons.len(), "risk evaluation completed");

    OverallResult {
        level,
        reasons,
        recommended_actions: actions,
        safety_flags,
    }
}

/// Build the knowledge-retrieval query from the present findings.
///
/// Retrieval must never run on an empty string, so a record with no findings
/// falls back to a generic wellness query.
pub fn build_knowledge_query(detection: &DetectionSummary) -> String {
    let present = detection.present_labels();
    if present.is_empty() {
        WELLNESS_QUERY.to_string()
    } else {
        present.join(", ")
    }
}
