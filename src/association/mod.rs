//! Spatial association of lines with nearby labels.
//!
//! Contour lines, lot lines, pavement edges and property boundaries look
//! alike once reduced to segments. What tells them apart on a drawing is the
//! label printed next to them, so this module keeps only lines whose
//! midpoint lies close to a label of the category under check.

pub mod conventions;
pub mod proximity;

pub use conventions::{check_contour_conventions, ContourConventionCheck, ConventionOutcome};
pub use proximity::{validate_label_proximity, FeatureType, ProximityIssue, ProximityRules};

use crate::geometry::euclidean_distance;
use crate::labels::{LabelCategory, LabelClassifier};
use crate::lines::{ClassifiedLines, Line};
use crate::text::TextElement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Label category that lines are associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFilter {
    /// Contour elevations and contour keywords
    Contour,
    /// Street names
    Street,
    /// Critical checklist markers
    CriticalMarker,
    /// Anything the classifier recognized
    AnyClassified,
}

impl LabelFilter {
    /// Whether a category passes this filter.
    pub fn accepts(&self, category: &LabelCategory) -> bool {
        match self {
            LabelFilter::Contour => category.is_contour(),
            LabelFilter::Street => matches!(category, LabelCategory::Street),
            LabelFilter::CriticalMarker => matches!(category, LabelCategory::CriticalMarker(_)),
            LabelFilter::AnyClassified => !matches!(category, LabelCategory::Unclassified),
        }
    }
}

/// Outcome of proximity filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationResult {
    /// Lines that went into the filter
    pub total_lines_detected: usize,
    /// Lines kept, in input order
    pub retained_lines: Vec<Line>,
    /// `1 - retained / total`, 0 when nothing was detected or the filter
    /// could not be applied
    pub filter_effectiveness: f64,
    /// Relevant labels that are the nearest label of at least one retained
    /// line, in input order
    pub matched_labels: Vec<TextElement>,
    /// False when no relevant label existed and every line passed through
    pub filter_applied: bool,
}

impl AssociationResult {
    /// Number of lines removed by the filter.
    pub fn removed_count(&self) -> usize {
        self.total_lines_detected - self.retained_lines.len()
    }

    /// Whether the result is a pass-through because no label qualified.
    pub fn is_degraded(&self) -> bool {
        !self.filter_applied
    }
}

/// Retains lines near relevant labels.
///
/// # Example
///
/// ```
/// use sheet_validator::association::{LabelFilter, SpatialAssociator};
/// use sheet_validator::geometry::BoundingBox;
/// use sheet_validator::lines::{ClassifiedLines, Line, LineKind, Segment};
/// use sheet_validator::text::TextElement;
///
/// let lines = ClassifiedLines::new(vec![
///     Line::new(Segment::new(0.0, 0.0, 100.0, 0.0), LineKind::Dashed, 1.0),
///     Line::new(Segment::new(0.0, 900.0, 100.0, 900.0), LineKind::Solid, 1.0),
/// ]);
/// let labels = vec![TextElement::new("250", BoundingBox::new(40, 10, 20, 10), 95.0)];
///
/// let result = SpatialAssociator::new(LabelFilter::Contour).filter_by_proximity(lines, &labels, 150.0);
/// assert_eq!(result.retained_lines.len(), 1);
/// assert_eq!(result.filter_effectiveness, 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct SpatialAssociator {
    classifier: LabelClassifier,
    filter: LabelFilter,
}

impl SpatialAssociator {
    /// Associate with the default label rules.
    pub fn new(filter: LabelFilter) -> Self {
        Self::with_classifier(LabelClassifier::default(), filter)
    }

    /// Associate using a specific classifier.
    pub fn with_classifier(classifier: LabelClassifier, filter: LabelFilter) -> Self {
        Self { classifier, filter }
    }

    /// Label classifier in use.
    pub fn classifier(&self) -> &LabelClassifier {
        &self.classifier
    }

    /// Labels that pass the category filter, in input order.
    pub fn relevant_labels<'a>(&self, labels: &'a [TextElement]) -> Vec<&'a TextElement> {
        labels
            .iter()
            .filter(|label| self.filter.accepts(&self.classifier.classify_element(label)))
            .collect()
    }

    /// Keep each line whose midpoint is within `max_distance` of the center
    /// of at least one relevant label.
    ///
    /// With no relevant labels every line is returned, effectiveness is 0 and
    /// `filter_applied` is false.
    pub fn filter_by_proximity(
        &self,
        lines: ClassifiedLines,
        labels: &[TextElement],
        max_distance: f64,
    ) -> AssociationResult {
        let total = lines.len();
        let relevant = self.relevant_labels(labels);

        if relevant.is_empty() {
            log::warn!(
                "No {:?} labels found; returning {} lines unfiltered",
                self.filter,
                total
            );
            return AssociationResult {
                total_lines_detected: total,
                retained_lines: lines.into_inner(),
                filter_effectiveness: 0.0,
                matched_labels: Vec::new(),
                filter_applied: false,
            };
        }

        let mut retained = Vec::new();
        let mut matched = BTreeSet::new();

        for line in lines.into_inner() {
            if let Some((index, distance)) = nearest_label(&line, &relevant) {
                if distance <= max_distance {
                    matched.insert(index);
                    retained.push(line);
                }
            }
        }

        let effectiveness = if total == 0 {
            0.0
        } else {
            1.0 - retained.len() as f64 / total as f64
        };

        log::info!(
            "Spatial filter kept {}/{} lines near {} labels ({:.1}% removed)",
            retained.len(),
            total,
            relevant.len(),
            effectiveness * 100.0
        );

        AssociationResult {
            total_lines_detected: total,
            retained_lines: retained,
            filter_effectiveness: effectiveness,
            matched_labels: matched.into_iter().map(|i| relevant[i].clone()).collect(),
            filter_applied: true,
        }
    }
}

/// Index and distance of the label closest to a line's midpoint.
///
/// Ties go to the earlier label.
pub(crate) fn nearest_label(line: &Line, labels: &[&TextElement]) -> Option<(usize, f64)> {
    let midpoint = line.midpoint();
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (i, euclidean_distance(&midpoint, &label.bbox().center())))
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
}
