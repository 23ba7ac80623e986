//! Contour drafting convention check.
//!
//! Existing-grade contours are drawn dashed and proposed-grade contours
//! solid. Each retained line is attributed to the nearest existing or
//! proposed contour label, then each group is checked against the stroke it
//! should have.

use super::{nearest_label, AssociationResult};
use crate::labels::{ContourKind, LabelCategory, LabelClassifier};
use crate::lines::{Line, LineKind};
use crate::text::TextElement;
use serde::Serialize;

/// Verdict for one contour kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConventionOutcome {
    /// Most attributed lines use the expected stroke
    Conforming,
    /// Most attributed lines use the other stroke
    NonConforming,
    /// No line could be attributed to this kind
    NotEvaluated,
}

/// Line tally for one contour kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindCheck {
    /// Stroke this kind should be drawn with
    pub expected: LineKind,
    /// Lines attributed to this kind
    pub associated_lines: usize,
    /// Attributed lines using the expected stroke
    pub conforming_lines: usize,
    /// Verdict
    pub outcome: ConventionOutcome,
    /// Majority share times mean line classification confidence, `[0, 1]`
    pub confidence: f64,
}

impl KindCheck {
    fn evaluate(expected: LineKind, lines: &[&Line]) -> Self {
        if lines.is_empty() {
            return Self {
                expected,
                associated_lines: 0,
                conforming_lines: 0,
                outcome: ConventionOutcome::NotEvaluated,
                confidence: 0.0,
            };
        }

        let total = lines.len();
        let conforming = lines.iter().filter(|l| l.kind == expected).count();
        let ratio = conforming as f64 / total as f64;
        let mean_confidence = lines.iter().map(|l| l.confidence).sum::<f64>() / total as f64;

        let outcome = if ratio >= 0.5 {
            ConventionOutcome::Conforming
        } else {
            ConventionOutcome::NonConforming
        };

        Self {
            expected,
            associated_lines: total,
            conforming_lines: conforming,
            outcome,
            confidence: (ratio.max(1.0 - ratio) * mean_confidence).clamp(0.0, 1.0),
        }
    }

    /// `Some(true)` when conforming, `None` when not evaluated.
    pub fn is_correct(&self) -> Option<bool> {
        match self.outcome {
            ConventionOutcome::Conforming => Some(true),
            ConventionOutcome::NonConforming => Some(false),
            ConventionOutcome::NotEvaluated => None,
        }
    }
}

/// Result of the contour convention check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourConventionCheck {
    /// Existing contours, expected dashed
    pub existing: KindCheck,
    /// Proposed contours, expected solid
    pub proposed: KindCheck,
    /// Retained lines not attributable to either kind
    pub unattributed_lines: usize,
    /// Caveats for the reader
    pub notes: Vec<String>,
}

impl ContourConventionCheck {
    /// Overall verdict: `None` unless at least one kind was evaluated.
    pub fn is_conforming(&self) -> Option<bool> {
        match (self.existing.is_correct(), self.proposed.is_correct()) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(true) && b.unwrap_or(true)),
        }
    }
}

/// Attribute retained lines to existing/proposed labels and check strokes.
pub fn check_contour_conventions(
    association: &AssociationResult,
    labels: &[TextElement],
    classifier: &LabelClassifier,
    max_distance: f64,
) -> ContourConventionCheck {
    let mut notes = Vec::new();
    if !association.filter_applied {
        notes.push("spatial filter not applied; lines may include non-contour geometry".to_string());
    }

    let mut keyed: Vec<(&TextElement, ContourKind)> = Vec::new();
    for label in labels {
        if let LabelCategory::Contour(kind @ (ContourKind::Existing | ContourKind::Proposed)) =
            classifier.classify_element(label)
        {
            keyed.push((label, kind));
        }
    }

    if keyed.is_empty() {
        notes.push("no existing or proposed contour labels found".to_string());
    }

    let refs: Vec<&TextElement> = keyed.iter().map(|(label, _)| *label).collect();
    let mut existing: Vec<&Line> = Vec::new();
    let mut proposed: Vec<&Line> = Vec::new();
    let mut unattributed = 0;

    for line in &association.retained_lines {
        match nearest_label(line, &refs) {
            Some((index, distance)) if distance <= max_distance => match keyed[index].1 {
                ContourKind::Existing => existing.push(line),
                _ => proposed.push(line),
            },
            _ => unattributed += 1,
        }
    }

    let check = ContourConventionCheck {
        existing: KindCheck::evaluate(LineKind::Dashed, &existing),
        proposed: KindCheck::evaluate(LineKind::Solid, &proposed),
        unattributed_lines: unattributed,
        notes,
    };

    log::info!(
        "Contour conventions: existing {:?} ({}/{}), proposed {:?} ({}/{})",
        check.existing.outcome,
        check.existing.conforming_lines,
        check.existing.associated_lines,
        check.proposed.outcome,
        check.proposed.conforming_lines,
        check.proposed.associated_lines
    );

    check
}
