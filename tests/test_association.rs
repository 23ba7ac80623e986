//! Integration tests for spatial association, contour conventions and
//! label proximity.

use proptest::prelude::*;
use sheet_validator::association::{
    check_contour_conventions, validate_label_proximity, ConventionOutcome, FeatureType, LabelFilter,
    ProximityRules, SpatialAssociator,
};
use sheet_validator::geometry::{BoundingBox, Point};
use sheet_validator::labels::LabelClassifier;
use sheet_validator::lines::{ClassifiedLines, Line, LineKind, Segment};
use sheet_validator::text::TextElement;
use std::collections::BTreeMap;

// ============================================================================
// Helpers
// ============================================================================

fn horizontal(y: f64, kind: LineKind) -> Line {
    Line::new(Segment::new(0.0, y, 200.0, y), kind, 1.0)
}

/// 20x10 label centered on (x, y).
fn label(text: &str, x: i32, y: i32) -> TextElement {
    TextElement::new(text, BoundingBox::new(x - 10, y - 5, 20, 10), 90.0)
}

// ============================================================================
// Spatial filter
// ============================================================================

#[test]
fn test_contour_lines_separated_from_other_geometry() {
    let _ = env_logger::builder().is_test(true).try_init();
    let lines = ClassifiedLines::new(vec![
        horizontal(100.0, LineKind::Dashed),
        horizontal(110.0, LineKind::Dashed),
        horizontal(600.0, LineKind::Solid),
        horizontal(1200.0, LineKind::Solid),
    ]);
    let labels = vec![label("EX 250", 100, 105), label("MAIN ST", 100, 1200)];

    let result = SpatialAssociator::new(LabelFilter::Contour).filter_by_proximity(lines, &labels, 150.0);

    assert!(result.filter_applied);
    assert_eq!(result.retained_lines.len(), 2);
    assert!((result.filter_effectiveness - 0.5).abs() < 1e-12);
    assert_eq!(result.matched_labels.len(), 1);
    assert_eq!(result.matched_labels[0].text(), "EX 250");
}

#[test]
fn test_without_contour_labels_lines_pass_through() {
    let lines = ClassifiedLines::new(vec![horizontal(0.0, LineKind::Solid), horizontal(50.0, LineKind::Dashed)]);
    let labels = vec![label("GENERAL NOTES", 0, 0)];

    let result = SpatialAssociator::new(LabelFilter::Contour).filter_by_proximity(lines, &labels, 150.0);

    assert!(result.is_degraded());
    assert_eq!(result.retained_lines.len(), 2);
    assert_eq!(result.filter_effectiveness, 0.0);
}

#[test]
fn test_conventions_after_association() {
    let lines = ClassifiedLines::new(vec![
        horizontal(100.0, LineKind::Dashed),
        horizontal(120.0, LineKind::Dashed),
        horizontal(800.0, LineKind::Dashed),
    ]);
    let labels = vec![label("EX 250", 100, 110), label("PROP 252", 100, 800)];
    let classifier = LabelClassifier::default();

    let assoc = SpatialAssociator::new(LabelFilter::Contour).filter_by_proximity(lines, &labels, 150.0);
    let check = check_contour_conventions(&assoc, &labels, &classifier, 150.0);

    assert_eq!(check.existing.outcome, ConventionOutcome::Conforming);
    assert_eq!(check.existing.associated_lines, 2);
    // proposed contour drawn dashed
    assert_eq!(check.proposed.outcome, ConventionOutcome::NonConforming);
    assert_eq!(check.is_conforming(), Some(false));
}

// ============================================================================
// Label proximity
// ============================================================================

#[test]
fn test_misplaced_marker_label_flagged() {
    let features = BTreeMap::from([
        (FeatureType::ConstructionEntrance, vec![Point::new(100.0, 100.0)]),
        (FeatureType::ConcreteWashout, vec![Point::new(900.0, 900.0)]),
    ]);
    let labels = vec![label("SCE", 120, 100), label("CONC WASH", 100, 100)];

    let issues = validate_label_proximity(
        &labels,
        &features,
        &ProximityRules::default(),
        &LabelClassifier::default(),
        40.0,
    );

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].label_text, "CONC WASH");
    assert_eq!(issues[0].feature_type, FeatureType::ConcreteWashout);
    assert!(issues[0].nearest_distance.unwrap() > 250.0 * 1.5);
}

// ============================================================================
// Properties
// ============================================================================

fn lines_strategy() -> impl Strategy<Value = Vec<Line>> {
    prop::collection::vec((0.0f64..1000.0, prop::bool::ANY), 0..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(y, dashed)| horizontal(y, if dashed { LineKind::Dashed } else { LineKind::Solid }))
            .collect()
    })
}

fn labels_strategy() -> impl Strategy<Value = Vec<TextElement>> {
    prop::collection::vec((0i32..200, 0i32..1000, 50u32..=500), 1..6).prop_map(|rows| {
        rows.into_iter()
            .map(|(x, y, elevation)| label(&elevation.to_string(), x, y))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_retained_grows_with_distance(
        lines in lines_strategy(),
        labels in labels_strategy(),
        near in 0.0f64..300.0,
        extra in 0.0f64..300.0,
    ) {
        let assoc = SpatialAssociator::new(LabelFilter::Contour);
        let tight = assoc.filter_by_proximity(ClassifiedLines::new(lines.clone()), &labels, near);
        let loose = assoc.filter_by_proximity(ClassifiedLines::new(lines), &labels, near + extra);

        prop_assert!(tight.retained_lines.len() <= loose.retained_lines.len());
        for line in &tight.retained_lines {
            prop_assert!(loose.retained_lines.contains(line));
        }
    }

    #[test]
    fn prop_effectiveness_bounded_and_counts_add_up(
        lines in lines_strategy(),
        labels in labels_strategy(),
        distance in 0.0f64..500.0,
    ) {
        let total = lines.len();
        let result = SpatialAssociator::new(LabelFilter::Contour)
            .filter_by_proximity(ClassifiedLines::new(lines), &labels, distance);

        prop_assert!((0.0..=1.0).contains(&result.filter_effectiveness));
        prop_assert_eq!(result.total_lines_detected, total);
        prop_assert_eq!(result.retained_lines.len() + result.removed_count(), total);
    }
}
