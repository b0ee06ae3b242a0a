//! Decoding of the semi-structured model response.
//!
//! The upstream prompt instructs the model to tag its answer with the three
//! section markers; tier 1 handles that contract-enforced path. Tier 2
//! recovers untagged answers by paragraph position, and tier 3 guarantees the
//! raw text is never lost. Parsing is total: it cannot fail.

use serde::{Deserialize, Serialize};

use super::StructuredReport;

/// Marker set splitting a raw response into sections. Configurable so a
/// future schema version can change the literals without touching the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMarkers {
    pub summary: String,
    pub details: String,
    pub disclaimer: String,
}

impl Default for ReportMarkers {
    fn default() -> Self {
        Self {
            summary: "SUMMARY:".to_string(),
            details: "DETAILS:".to_string(),
            disclaimer: "DISCLAIMER:".to_string(),
        }
    }
}

const FALLBACK_SUMMARY: &str = "The analysis report could not be fully decoded.";

/// Parse a raw model response with the default marker set.
pub fn parse_report(raw: &str) -> StructuredReport {
    parse_with_markers(raw, &ReportMarkers::default())
}

/// Parse a raw model response into the three-field report contract.
///
/// All three fields are always populated strings; callers never need
/// null-checks.
pub fn parse_with_markers(raw: &str, markers: &ReportMarkers) -> StructuredReport {
    if let Some(report) = parse_tagged(raw, markers) {
        return report;
    }
    parse_paragraphs(raw).unwrap_or_else(|| fallback_report(raw))
}

/// Tier 1: all three markers present in left-to-right order.
fn parse_tagged(raw: &str, markers: &ReportMarkers) -> Option<StructuredReport> {
    // Each search starts after the previous marker's full text, so a marker
    // that overlaps another marker's literal cannot produce inverted slices.
    let summary_end = raw.find(&markers.summary)? + markers.summary.len();
    let details_at = raw[summary_end..].find(&markers.details)? + summary_end;
    let details_end = details_at + markers.details.len();
    let disclaimer_at = raw[details_end..].find(&markers.disclaimer)? + details_end;

    let summary = raw[summary_end..details_at].trim();
    let details = raw[details_end..disclaimer_at].trim();
    let disclaimer = raw[disclaimer_at + markers.disclaimer.len()..].trim();

    Some(StructuredReport {
        summary: summary.to_string(),
        details: details.to_string(),
        disclaimer: disclaimer.to_string(),
    })
}

/// Tier 2: positional recovery on blank-line paragraph boundaries.
fn parse_paragraphs(raw: &str) -> Option<StructuredReport> {
    let paragraphs: Vec<&str> = raw
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match paragraphs.as_slice() {
        [] => None,
        [only] => Some(StructuredReport {
            summary: (*only).to_string(),
            details: String::new(),
            disclaimer: String::new(),
        }),
        [first, middle @ .., last] => Some(StructuredReport {
            summary: (*first).to_string(),
            details: middle.join("\n\n"),
            disclaimer: (*last).to_string(),
        }),
    }
}

/// Tier 3: keep the raw text verbatim so nothing is silently lost.
fn fallback_report(raw: &str) -> StructuredReport {
    StructuredReport {
        summary: FALLBACK_SUMMARY.to_string(),
        details: raw.to_string(),
        disclaimer: String::new(),
    }
}
