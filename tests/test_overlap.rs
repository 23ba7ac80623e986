//! Integration tests for overlapping text detection.

use proptest::prelude::*;
use sheet_validator::geometry::BoundingBox;
use sheet_validator::overlap::{
    create_artifact_filter, detect_overlaps, OverlapDetector, Severity,
};
use sheet_validator::text::TextElement;

fn element(text: &str, x: i32, y: i32, w: u32, h: u32, confidence: f32) -> TextElement {
    TextElement::new(text, BoundingBox::new(x, y, w, h), confidence)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_offset_labels_are_one_critical_issue() {
    let elements = vec![
        element("SCE", 10, 10, 50, 20, 90.0),
        element("CONC WASH", 15, 12, 50, 20, 85.0),
    ];

    let issues = detect_overlaps(&elements, 40.0, Severity::Minor);

    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    // 45 x 18 intersection over a 50 x 20 box
    assert_eq!(issue.overlap_area, 810);
    assert!((issue.overlap_percent - 81.0).abs() < 1e-9);
    assert_eq!(issue.severity, Severity::Critical);
    assert_eq!(issue.element_a.text(), "SCE");
    assert_eq!(issue.element_b.text(), "CONC WASH");
}

#[test]
fn test_identical_text_is_not_an_issue() {
    let elements = vec![
        element("SILT FENCE", 100, 100, 80, 14, 92.0),
        element("SILT FENCE", 104, 101, 80, 14, 88.0),
    ];
    assert!(detect_overlaps(&elements, 40.0, Severity::Minor).is_empty());
}

#[test]
fn test_pairs_follow_input_order() {
    let elements = vec![
        element("A1", 0, 0, 20, 10, 90.0),
        element("B2", 100, 0, 20, 10, 90.0),
        element("C3", 5, 0, 20, 10, 90.0),
        element("D4", 105, 0, 20, 10, 90.0),
    ];
    let issues = detect_overlaps(&elements, 0.0, Severity::Minor);
    let pairs: Vec<(&str, &str)> = issues
        .iter()
        .map(|i| (i.element_a.text(), i.element_b.text()))
        .collect();
    assert_eq!(pairs, vec![("A1", "C3"), ("B2", "D4")]);
}

#[test]
fn test_severity_bands() {
    // 10x10 boxes shifted horizontally: overlap share = (10 - shift) * 10%
    let cases = [(4, Severity::Critical), (5, Severity::Warning), (8, Severity::Minor)];
    for (shift, expected) in cases {
        let elements = vec![element("A", 0, 0, 10, 10, 90.0), element("B", shift, 0, 10, 10, 90.0)];
        let issues = detect_overlaps(&elements, 0.0, Severity::Minor);
        assert_eq!(issues[0].severity, expected, "shift {}", shift);
    }
}

#[test]
fn test_artifact_refinement_keeps_artifacts_separately() {
    let elements = vec![
        element("CONC WASH", 0, 0, 90, 14, 90.0),
        element("CONC WASB", 3, 1, 90, 14, 60.0),
        element("250", 200, 0, 30, 14, 95.0),
        element("MAIN ST", 205, 2, 60, 14, 95.0),
    ];

    let detector = OverlapDetector::from_choice(create_artifact_filter(true, None));
    let outcome = detector.detect(&elements, 40.0, Severity::Minor);

    assert_eq!(outcome.artifact_filter.as_deref(), Some("rule_based"));
    assert_eq!(outcome.artifacts.len(), 1);
    assert_eq!(outcome.artifacts[0].element_b.text(), "CONC WASB");
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.issues[0].element_a.text(), "250");
    assert!(outcome.degraded_reason.is_none());
}

// ============================================================================
// Properties
// ============================================================================

fn any_box() -> impl Strategy<Value = BoundingBox> {
    (-50i32..50, -50i32..50, 0u32..60, 0u32..60).prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
}

proptest! {
    #[test]
    fn prop_overlap_percent_in_range(a in any_box(), b in any_box()) {
        let percent = a.overlap_percent(&b);
        prop_assert!((0.0..=100.0).contains(&percent));
        if a.intersection(&b).is_none() {
            prop_assert_eq!(percent, 0.0);
        }
    }

    #[test]
    fn prop_identical_boxes_fully_overlap(x in -50i32..50, y in -50i32..50, w in 1u32..60, h in 1u32..60) {
        let bbox = BoundingBox::new(x, y, w, h);
        prop_assert_eq!(bbox.overlap_percent(&bbox), 100.0);
    }

    #[test]
    fn prop_raising_floor_never_adds_issues(boxes in proptest::collection::vec(any_box(), 0..8)) {
        let elements: Vec<TextElement> = boxes
            .into_iter()
            .enumerate()
            .map(|(i, bbox)| TextElement::new(format!("L{}", i), bbox, 90.0))
            .collect();
        let minor = detect_overlaps(&elements, 0.0, Severity::Minor).len();
        let warning = detect_overlaps(&elements, 0.0, Severity::Warning).len();
        let critical = detect_overlaps(&elements, 0.0, Severity::Critical).len();
        prop_assert!(minor >= warning && warning >= critical);
    }
}
