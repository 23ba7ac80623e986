//! Per-page validation report.

use crate::association::{AssociationResult, ContourConventionCheck, ProximityIssue};
use crate::checklist::ChecklistSummary;
use crate::error::Result;
use crate::lines::{ClassifiedLines, LineGroup, LineKind};
use crate::overlap::OverlapOutcome;
use crate::symbols::SymbolSearch;
use serde::Serialize;
use std::collections::BTreeMap;

/// How a phase ended.
///
/// `NotEvaluated` means the phase was never attempted, which is distinct
/// from a completed phase that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Ran normally
    Completed,
    /// Ran with reduced confidence
    Degraded {
        /// What was missing
        reason: String,
    },
    /// Could not run
    Failed {
        /// Error message
        error: String,
    },
    /// Not attempted
    NotEvaluated,
}

impl PhaseOutcome {
    /// True for `Completed` and `Degraded`.
    pub fn ran(&self) -> bool {
        matches!(self, PhaseOutcome::Completed | PhaseOutcome::Degraded { .. })
    }

    /// True for `Failed`.
    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseOutcome::Failed { .. })
    }
}

/// Outcome of every phase for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseStatus {
    /// Line detection and classification
    pub lines: PhaseOutcome,
    /// Spatial association with contour labels
    pub association: PhaseOutcome,
    /// Existing/proposed stroke convention
    pub contour_conventions: PhaseOutcome,
    /// Street counting
    pub streets: PhaseOutcome,
    /// Overlapping text
    pub overlaps: PhaseOutcome,
    /// Reference symbol search
    pub symbols: PhaseOutcome,
    /// Critical marker checklist
    pub checklist: PhaseOutcome,
    /// Label-to-feature distances
    pub label_proximity: PhaseOutcome,
}

impl Default for PhaseStatus {
    fn default() -> Self {
        Self {
            lines: PhaseOutcome::NotEvaluated,
            association: PhaseOutcome::NotEvaluated,
            contour_conventions: PhaseOutcome::NotEvaluated,
            streets: PhaseOutcome::NotEvaluated,
            overlaps: PhaseOutcome::NotEvaluated,
            symbols: PhaseOutcome::NotEvaluated,
            checklist: PhaseOutcome::NotEvaluated,
            label_proximity: PhaseOutcome::NotEvaluated,
        }
    }
}

/// Detected line counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSummary {
    /// All classified lines
    pub total: usize,
    /// Solid lines
    pub solid: usize,
    /// Dashed lines
    pub dashed: usize,
}

impl LineSummary {
    /// Count lines by kind.
    pub fn from_lines(lines: &ClassifiedLines) -> Self {
        Self {
            total: lines.len(),
            solid: lines.count_kind(LineKind::Solid),
            dashed: lines.count_kind(LineKind::Dashed),
        }
    }
}

/// Streets found by parallel-line grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetSummary {
    /// Number of groups
    pub count: usize,
    /// The groups, in seed order
    pub groups: Vec<LineGroup>,
}

/// Everything found on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Page identifier
    pub page_id: String,
    /// Engine that produced the recognized text
    pub recognition_engine: String,
    /// True when the primary recognition engine was unavailable
    pub used_fallback_engine: bool,
    /// Number of recognized text elements
    pub text_elements: usize,
    /// Line counts
    pub lines: Option<LineSummary>,
    /// Lines retained near contour labels
    pub association: Option<AssociationResult>,
    /// Existing/proposed stroke convention
    pub contour_conventions: Option<ContourConventionCheck>,
    /// Street count
    pub streets: Option<StreetSummary>,
    /// Overlapping text
    pub overlaps: Option<OverlapOutcome>,
    /// Symbol searches keyed by symbol type
    pub symbols: Option<BTreeMap<String, SymbolSearch>>,
    /// Critical marker checklist
    pub checklist: Option<ChecklistSummary>,
    /// Labels far from the feature they name
    pub label_proximity: Option<Vec<ProximityIssue>>,
    /// Phase outcomes
    pub phases: PhaseStatus,
}

impl ValidationReport {
    /// Empty report with every phase not evaluated.
    pub fn new(page_id: impl Into<String>, recognition_engine: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            recognition_engine: recognition_engine.into(),
            used_fallback_engine: false,
            text_elements: 0,
            lines: None,
            association: None,
            contour_conventions: None,
            streets: None,
            overlaps: None,
            symbols: None,
            checklist: None,
            label_proximity: None,
            phases: PhaseStatus::default(),
        }
    }

    /// Pretty-printed JSON. Field and element order are deterministic.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Phases that failed, by name.
    pub fn failed_phases(&self) -> Vec<&'static str> {
        let p = &self.phases;
        [
            ("lines", &p.lines),
            ("association", &p.association),
            ("contour_conventions", &p.contour_conventions),
            ("streets", &p.streets),
            ("overlaps", &p.overlaps),
            ("symbols", &p.symbols),
            ("checklist", &p.checklist),
            ("label_proximity", &p.label_proximity),
        ]
        .into_iter()
        .filter(|(_, outcome)| outcome.is_failed())
        .map(|(name, _)| name)
        .collect()
    }

    /// Number of genuine overlap issues.
    pub fn overlap_count(&self) -> usize {
        self.overlaps.as_ref().map_or(0, |o| o.issues.len())
    }

    /// Symbol types with a reported match.
    pub fn detected_symbols(&self) -> Vec<&str> {
        self.symbols
            .iter()
            .flatten()
            .filter(|(_, search)| search.best.is_some())
            .map(|(symbol, _)| symbol.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_not_evaluated() {
        let report = ValidationReport::new("p1", "precomputed");
        assert_eq!(report.phases.lines, PhaseOutcome::NotEvaluated);
        assert!(!report.phases.lines.ran());
        assert!(report.failed_phases().is_empty());
        assert_eq!(report.overlap_count(), 0);
    }

    #[test]
    fn test_phase_outcome_json() {
        let json = serde_json::to_string(&PhaseOutcome::Degraded {
            reason: "no labels".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"degraded","reason":"no labels"}"#);
        assert_eq!(
            serde_json::to_string(&PhaseOutcome::NotEvaluated).unwrap(),
            r#"{"status":"not_evaluated"}"#
        );
    }

    #[test]
    fn test_failed_phases_listed() {
        let mut report = ValidationReport::new("p1", "engine");
        report.phases.lines = PhaseOutcome::Failed {
            error: "bad raster".to_string(),
        };
        assert_eq!(report.failed_phases(), vec!["lines"]);
        assert!(report.to_json().unwrap().contains("bad raster"));
    }
}
