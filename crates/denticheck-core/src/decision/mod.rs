use std::collections::{btree_map::Entry, BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

pub mod rules;

/// Canonical finding vocabulary used by the rule engine. Raw detector labels
/// are mapped onto these before a record is constructed.
pub mod labels {
    pub const CARIES: &str = "caries";
    pub const TARTAR: &str = "tartar";
    pub const LESION: &str = "lesion";
    pub const NORMAL: &str = "normal";
}

static LABEL_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("calculus", labels::TARTAR),
        ("oral_cancer", labels::LESION),
    ])
});

/// Map a raw detector label onto the canonical vocabulary.
///
/// Unknown labels pass through lowercased; the rule engine ignores them.
pub fn canonical_label(raw: &str) -> String {
    let key = raw.trim().to_ascii_lowercase();
    match LABEL_SYNONYMS.get(key.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => key,
    }
}

/// Session metadata for one screening. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMeta {
    pub session_id: Uuid,
    pub subject_id: Uuid,
    pub image_id: Uuid,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub model_versions: BTreeMap<String, String>,
}

/// Quality-gate verdict for the captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    Recapture,
}

/// Numeric image-quality metrics reported by the gate. Read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateMetrics {
    pub oral_present_prob: f32,
    pub blur_score: f32,
    pub brightness_mean: f32,
    pub clipping_ratio: f32,
    pub contrast_std: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub status: GateStatus,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub metrics: GateMetrics,
}

/// Per-class summary of the object-detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub present: bool,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub max_score: f32,
    #[serde(default)]
    pub area_ratio: f32,
}

impl ClassSummary {
    fn merge(&mut self, other: &ClassSummary) {
        self.present |= other.present;
        self.count += other.count;
        self.max_score = self.max_score.max(other.max_score);
        self.area_ratio += other.area_ratio;
    }
}

/// Detection summary keyed by canonical label.
///
/// Construction always runs the synonym normalization, merging entries that
/// collapse onto the same canonical label (e.g. `calculus` and `tartar`).
#[derive(Debug, Clone, Default)]
pub struct DetectionSummary {
    classes: BTreeMap<String, ClassSummary>,
}

impl DetectionSummary {
    pub fn from_raw(raw: impl IntoIterator<Item = (String, ClassSummary)>) -> Self {
        let mut classes: BTreeMap<String, ClassSummary> = BTreeMap::new();
        for (label, summary) in raw {
            match classes.entry(canonical_label(&label)) {
                Entry::Vacant(slot) => {
                    slot.insert(summary);
                }
                Entry::Occupied(mut slot) => slot.get_mut().merge(&summary),
            }
        }
        Self { classes }
    }

    pub fn get(&self, label: &str) -> Option<&ClassSummary> {
        self.classes.get(label)
    }

    pub fn is_present(&self, label: &str) -> bool {
        self.classes.get(label).is_some_and(|class| class.present)
    }

    /// Canonical labels flagged present, in deterministic (sorted) order.
    pub fn present_labels(&self) -> Vec<&str> {
        self.classes
            .iter()
            .filter(|(_, class)| class.present)
            .map(|(label, _)| label.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClassSummary)> {
        self.classes
            .iter()
            .map(|(label, class)| (label.as_str(), class))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Serialize for DetectionSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.classes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DetectionSummary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ClassSummary>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

/// Classifier output for one screened condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionScore {
    pub prob: f32,
    pub suspect: bool,
    pub threshold: f32,
}

/// Probabilistic screening results from the gum-condition classifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlResult {
    pub gingivitis: ConditionScore,
    pub periodontal: ConditionScore,
}

/// Free-form patient survey answers plus an optional derived risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResult {
    #[serde(default)]
    pub answers: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub risk_score: Option<f32>,
}

/// Ordinal urgency classification. Ordering matters: escalation is monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    Attention,
    RecommendVisit,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Attention => "attention",
            RiskLevel::RecommendVisit => "recommend_visit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

/// A coded care recommendation emitted by the rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub code: String,
    pub priority: ActionPriority,
}

impl RecommendedAction {
    pub fn new(code: impl Into<String>, priority: ActionPriority) -> Self {
        Self {
            code: code.into(),
            priority,
        }
    }
}

/// Verdict produced by the rule engine; never hand-constructed elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallResult {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub safety_flags: BTreeMap<String, bool>,
}

/// Aggregate of all upstream findings for one screening session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub meta: DecisionMeta,
    pub gate: GateResult,
    pub detection: DetectionSummary,
    #[serde(default)]
    pub ml: Option<MlResult>,
    #[serde(default)]
    pub survey: Option<SurveyResult>,
    #[serde(default)]
    pub history: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub overall: Option<OverallResult>,
}

impl DecisionRecord {
    /// Reject malformed inputs at the boundary, before rule evaluation.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if !(0.0..=1.0).contains(&self.gate.metrics.oral_present_prob) {
            return Err(RecordValidationError::InvalidGateProbability {
                prob: self.gate.metrics.oral_present_prob,
            });
        }
        for (label, class) in self.detection.iter() {
            if !(0.0..=1.0).contains(&class.max_score) {
                return Err(RecordValidationError::InvalidDetectionScore {
                    label: label.to_string(),
                    score: class.max_score,
                });
            }
            if class.area_ratio < 0.0 {
                return Err(RecordValidationError::InvalidAreaRatio {
                    label: label.to_string(),
                    area_ratio: class.area_ratio,
                });
            }
        }
        if let Some(ml) = &self.ml {
            for (condition, score) in [("gingivitis", &ml.gingivitis), ("periodontal", &ml.periodontal)] {
                if !(0.0..=1.0).contains(&score.prob) {
                    return Err(RecordValidationError::InvalidProbability {
                        condition: condition.to_string(),
                        prob: score.prob,
                    });
                }
                if !(0.0..=1.0).contains(&score.threshold) {
                    return Err(RecordValidationError::InvalidThreshold {
                        condition: condition.to_string(),
                        threshold: score.threshold,
                    });
                }
            }
        }
        if let Some(survey) = &self.survey {
            if let Some(score) = survey.risk_score {
                if !(0.0..=1.0).contains(&score) {
                    return Err(RecordValidationError::InvalidSurveyScore { score });
                }
            }
        }
        Ok(())
    }
}

/// Input-shape errors detected while validating a decision record.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordValidationError {
    #[error("gate oral-presence probability must be within 0.0..=1.0 (got {prob})")]
    InvalidGateProbability { prob: f32 },
    #[error("detection class `{label}` max score must be within 0.0..=1.0 (got {score})")]
    InvalidDetectionScore { label: String, score: f32 },
    #[error("detection class `{label}` area ratio must be >= 0.0 (got {area_ratio})")]
    InvalidAreaRatio { label: String, area_ratio: f32 },
    #[error("ml condition `{condition}` probability must be within 0.0..=1.0 (got {prob})")]
    InvalidProbability { condition: String, prob: f32 },
    #[error("ml condition `{condition}` threshold must be within 0.0..=1.0 (got {threshold})")]
    InvalidThreshold { condition: String, threshold: f32 },
    #[error("survey risk score must be within 0.0..=1.0 (got {score})")]
    InvalidSurveyScore { score: f32 },
}
