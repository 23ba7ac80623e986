//! Critical marker checklist.
//!
//! Certain markers must appear on every sheet. A missing critical marker is
//! always reported as a finding with a zero count; it is never left out of
//! the summary.

use crate::labels::{CriticalMarkerKind, LabelCategory, LabelClassifier};
use crate::text::TextElement;
use serde::{Deserialize, Serialize};

/// Minimum occurrences per critical marker kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistRequirements {
    /// Stabilized construction entrances
    pub min_construction_entrances: usize,
    /// Concrete washouts
    pub min_concrete_washouts: usize,
    /// Silt fence labels
    pub min_silt_fences: usize,
    /// Limits of construction labels
    pub min_limits_of_construction: usize,
}

impl Default for ChecklistRequirements {
    fn default() -> Self {
        Self {
            min_construction_entrances: 1,
            min_concrete_washouts: 1,
            min_silt_fences: 0,
            min_limits_of_construction: 0,
        }
    }
}

impl ChecklistRequirements {
    /// Required count for a kind.
    pub fn minimum(&self, kind: CriticalMarkerKind) -> usize {
        match kind {
            CriticalMarkerKind::ConstructionEntrance => self.min_construction_entrances,
            CriticalMarkerKind::ConcreteWashout => self.min_concrete_washouts,
            CriticalMarkerKind::SiltFence => self.min_silt_fences,
            CriticalMarkerKind::LimitsOfConstruction => self.min_limits_of_construction,
        }
    }
}

/// Count and verdict for one marker kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFinding {
    /// Marker kind
    pub kind: CriticalMarkerKind,
    /// Labels classified as this kind
    pub count: usize,
    /// Required count
    pub required: usize,
    /// At least one label found
    pub detected: bool,
    /// `count >= required`
    pub meets_minimum: bool,
    /// Detection confidence, 0 when not detected
    pub confidence: f64,
    /// Matching label texts, in input order
    pub matches: Vec<String>,
}

/// Checklist verdict over all critical marker kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistSummary {
    /// One finding per kind, in [`CriticalMarkerKind::ALL`] order
    pub findings: Vec<MarkerFinding>,
    /// Kinds below their required count
    pub critical_failures: Vec<CriticalMarkerKind>,
    /// Share of kinds detected
    pub pass_rate: f64,
    /// Mean confidence over detected kinds, 0 when none
    pub avg_confidence: f64,
}

impl ChecklistSummary {
    /// True when every requirement is met.
    pub fn passed(&self) -> bool {
        self.critical_failures.is_empty()
    }

    /// Finding for a kind.
    pub fn finding(&self, kind: CriticalMarkerKind) -> Option<&MarkerFinding> {
        self.findings.iter().find(|f| f.kind == kind)
    }
}

/// Confidence for `count` detections: 0.9 for one, rising 0.01 per
/// occurrence, capped at 0.95.
pub fn detection_confidence(count: usize) -> f64 {
    match count {
        0 => 0.0,
        1 => 0.9,
        n => f64::min(0.95, 0.9 + n as f64 * 0.01),
    }
}

/// Count critical markers among the labels and verify the requirements.
pub fn evaluate_checklist(
    elements: &[TextElement],
    classifier: &LabelClassifier,
    requirements: &ChecklistRequirements,
) -> ChecklistSummary {
    let categories: Vec<LabelCategory> = elements.iter().map(|e| classifier.classify_element(e)).collect();

    let findings: Vec<MarkerFinding> = CriticalMarkerKind::ALL
        .iter()
        .map(|&kind| {
            let matches: Vec<String> = elements
                .iter()
                .zip(&categories)
                .filter(|(_, category)| **category == LabelCategory::CriticalMarker(kind))
                .map(|(e, _)| e.text().to_string())
                .collect();
            let count = matches.len();
            let required = requirements.minimum(kind);
            MarkerFinding {
                kind,
                count,
                required,
                detected: count > 0,
                meets_minimum: count >= required,
                confidence: detection_confidence(count),
                matches,
            }
        })
        .collect();

    let critical_failures: Vec<CriticalMarkerKind> =
        findings.iter().filter(|f| !f.meets_minimum).map(|f| f.kind).collect();
    for finding in findings.iter().filter(|f| !f.meets_minimum) {
        log::warn!(
            "Missing critical marker {}: required {}, found {}",
            finding.kind,
            finding.required,
            finding.count
        );
    }

    let detected: Vec<&MarkerFinding> = findings.iter().filter(|f| f.detected).collect();
    let avg_confidence = if detected.is_empty() {
        0.0
    } else {
        detected.iter().map(|f| f.confidence).sum::<f64>() / detected.len() as f64
    };
    let pass_rate = detected.len() as f64 / findings.len() as f64;

    log::info!(
        "Checklist: {}/{} marker kinds detected, {} critical failure(s)",
        detected.len(),
        findings.len(),
        critical_failures.len()
    );

    ChecklistSummary {
        findings,
        critical_failures,
        pass_rate,
        avg_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn labels(texts: &[&str]) -> Vec<TextElement> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextElement::new(*t, BoundingBox::new(0, i as i32 * 20, 60, 12), 90.0))
            .collect()
    }

    #[test]
    fn test_confidence_curve() {
        assert_eq!(detection_confidence(0), 0.0);
        assert_eq!(detection_confidence(1), 0.9);
        assert!((detection_confidence(3) - 0.93).abs() < 1e-12);
        assert_eq!(detection_confidence(10), 0.95);
    }

    #[test]
    fn test_complete_sheet_passes() {
        let summary = evaluate_checklist(
            &labels(&["SCE", "CONC WASH", "SCE", "250"]),
            &LabelClassifier::default(),
            &ChecklistRequirements::default(),
        );
        assert!(summary.passed());
        let sce = summary.finding(CriticalMarkerKind::ConstructionEntrance).unwrap();
        assert_eq!(sce.count, 2);
        assert_eq!(sce.matches, vec!["SCE", "SCE"]);
        assert!((sce.confidence - 0.92).abs() < 1e-12);
        assert_eq!(summary.pass_rate, 0.5);
    }

    #[test]
    fn test_missing_marker_reported_explicitly() {
        let summary = evaluate_checklist(
            &labels(&["SCE"]),
            &LabelClassifier::default(),
            &ChecklistRequirements::default(),
        );
        assert!(!summary.passed());
        assert_eq!(summary.critical_failures, vec![CriticalMarkerKind::ConcreteWashout]);
        let washout = summary.finding(CriticalMarkerKind::ConcreteWashout).unwrap();
        assert_eq!(washout.count, 0);
        assert!(!washout.detected);
        assert_eq!(washout.confidence, 0.0);
        // every kind appears, detected or not
        assert_eq!(summary.findings.len(), CriticalMarkerKind::ALL.len());
    }

    #[test]
    fn test_qualified_markers_counted() {
        let summary = evaluate_checklist(
            &labels(&["PROPOSED SCE", "PROP. CONC WASHOUT", "EX 250"]),
            &LabelClassifier::default(),
            &ChecklistRequirements::default(),
        );
        assert!(summary.critical_failures.is_empty());
        let sce = summary.finding(CriticalMarkerKind::ConstructionEntrance).unwrap();
        assert_eq!(sce.matches, vec!["PROPOSED SCE"]);
        let washout = summary.finding(CriticalMarkerKind::ConcreteWashout).unwrap();
        assert_eq!(washout.matches, vec!["PROP. CONC WASHOUT"]);
    }

    #[test]
    fn test_empty_sheet() {
        let summary = evaluate_checklist(&[], &LabelClassifier::default(), &ChecklistRequirements::default());
        assert_eq!(summary.critical_failures.len(), 2);
        assert_eq!(summary.avg_confidence, 0.0);
        assert_eq!(summary.pass_rate, 0.0);
    }
}
