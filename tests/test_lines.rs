//! Integration tests for line detection and solid/dashed classification.

use image::{GrayImage, Luma};
use sheet_validator::config::{LineDetectionConfig, StreetGroupingConfig};
use sheet_validator::lines::{group_parallel_lines, LineDetector, LineKind, Segment};

// ============================================================================
// Helpers
// ============================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn white(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Draw a 2 px thick horizontal stroke; `off == 0` draws it solid.
fn stroke(img: &mut GrayImage, y: u32, x0: u32, x1: u32, on: u32, off: u32) {
    let mut x = x0;
    while x < x1 {
        for dx in 0..on {
            if x + dx >= x1 {
                break;
            }
            img.put_pixel(x + dx, y, Luma([0]));
            img.put_pixel(x + dx, y + 1, Luma([0]));
        }
        x += on + off;
    }
}

// ============================================================================
// Detection
// ============================================================================

#[test]
fn test_solid_stroke_detected_as_solid() {
    init_logging();
    let mut img = white(600, 200);
    stroke(&mut img, 100, 50, 550, 500, 0);

    let lines = LineDetector::default().detect_lines(&img).unwrap();
    let line = lines
        .lines()
        .iter()
        .find(|l| (l.midpoint().y - 100.5).abs() < 5.0)
        .expect("solid line near y=100");

    assert_eq!(line.kind, LineKind::Solid);
    assert!(line.length() > 400.0, "length {}", line.length());
    assert!(line.confidence > 0.0 && line.confidence <= 1.0);
}

#[test]
fn test_dashed_stroke_detected_as_dashed() {
    init_logging();
    let mut img = white(600, 200);
    stroke(&mut img, 100, 50, 550, 12, 8);

    let lines = LineDetector::default().detect_lines(&img).unwrap();
    let near: Vec<_> = lines
        .lines()
        .iter()
        .filter(|l| (l.midpoint().y - 100.5).abs() < 5.0)
        .collect();

    assert!(!near.is_empty(), "no line near y=100");
    assert!(near.iter().any(|l| l.kind == LineKind::Dashed));
}

#[test]
fn test_blank_raster_has_no_lines() {
    init_logging();
    let lines = LineDetector::default().detect_lines(&white(400, 300)).unwrap();
    assert!(lines.is_empty());
}

#[test]
fn test_zero_dimension_rejected() {
    let err = LineDetector::default().detect_lines(&GrayImage::new(0, 10)).unwrap_err();
    assert!(err.to_string().contains("zero dimension"));
}

#[test]
fn test_detection_is_deterministic() {
    let mut img = white(600, 300);
    stroke(&mut img, 80, 40, 560, 500, 0);
    stroke(&mut img, 200, 40, 560, 12, 8);

    let detector = LineDetector::default();
    let first = detector.detect_lines(&img).unwrap();
    let second = detector.detect_lines(&img).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_min_line_length_respected() {
    let mut img = white(600, 200);
    stroke(&mut img, 100, 50, 550, 500, 0);

    let config = LineDetectionConfig {
        min_line_length: 200,
        ..LineDetectionConfig::default()
    };
    let raw = LineDetector::new(config).detect_raw(&img).unwrap();
    assert!(raw.segments().iter().all(|s| s.length() >= 200.0));
}

// ============================================================================
// Street grouping
// ============================================================================

#[test]
fn test_parallel_edges_form_one_street() {
    let segments = vec![
        Segment::new(0.0, 100.0, 1200.0, 100.0),
        Segment::new(0.0, 160.0, 1200.0, 165.0),
        Segment::new(600.0, 0.0, 600.0, 1200.0),
    ];
    let groups = group_parallel_lines(&segments, &StreetGroupingConfig::default());

    // the vertical segment is too short to stand alone
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].segments.len(), 2);
    assert_eq!(groups[0].seed(), &segments[0]);
}

#[test]
fn test_short_segments_ignored_for_streets() {
    let segments = vec![Segment::new(0.0, 0.0, 300.0, 0.0), Segment::new(0.0, 20.0, 300.0, 20.0)];
    assert!(group_parallel_lines(&segments, &StreetGroupingConfig::default()).is_empty());
}
