//! Integration tests for reference symbol matching.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use proptest::prelude::*;
use sheet_validator::symbols::{locate, locate_with_deadline, SymbolMatcher, Template, TemplateLibrary};
use std::time::Instant;

// ============================================================================
// Helpers
// ============================================================================

/// Asymmetric arrow-like glyph: a stem with a bar near the bottom.
fn glyph() -> GrayImage {
    GrayImage::from_fn(12, 12, |x, y| {
        let ink = (x < 3 && y < 10) || ((7..10).contains(&y) && x < 9);
        Luma([if ink { 0 } else { 255 }])
    })
}

fn page_with(symbol: &GrayImage, x: i64, y: i64) -> GrayImage {
    let mut page = GrayImage::from_pixel(120, 90, Luma([255]));
    imageops::replace(&mut page, symbol, x, y);
    page
}

fn north_arrow() -> Template {
    Template::new("north_arrow", "north_arrow", glyph()).unwrap()
}

// ============================================================================
// Locating
// ============================================================================

#[test]
fn test_exact_copy_found_at_its_location() {
    let _ = env_logger::builder().is_test(true).try_init();
    let page = page_with(&glyph(), 40, 30);

    let found = locate(&page, &north_arrow(), &[1.0], &[0.0], 0.7)
        .unwrap()
        .expect("exact copy should match");

    assert_eq!(found.location, (40, 30));
    assert_eq!(found.size, (12, 12));
    assert!(found.confidence > 0.99, "confidence {}", found.confidence);
    assert_eq!(found.symbol, "north_arrow");
}

#[test]
fn test_scaled_copy_found_at_matching_scale() {
    let big = imageops::resize(&glyph(), 24, 24, FilterType::Triangle);
    let page = page_with(&big, 70, 20);

    let found = locate(&page, &north_arrow(), &[0.5, 1.0, 2.0], &[0.0], 0.7)
        .unwrap()
        .expect("scaled copy should match");

    assert_eq!(found.scale, 2.0);
    assert_eq!(found.location, (70, 20));
    assert!(found.confidence > 0.99);
}

#[test]
fn test_rotated_copy_found_at_matching_rotation() {
    let turned = imageops::rotate90(&glyph());
    let page = page_with(&turned, 10, 50);

    let found = locate(&page, &north_arrow(), &[1.0], &[0.0, 90.0, 180.0, 270.0], 0.7)
        .unwrap()
        .expect("rotated copy should match");

    assert_eq!(found.rotation_degrees, 90.0);
    assert_eq!(found.location, (10, 50));
}

#[test]
fn test_blank_page_reports_nothing() {
    let page = GrayImage::from_pixel(120, 90, Luma([255]));
    let found = locate(&page, &north_arrow(), &[1.0], &[0.0], 0.7).unwrap();
    assert!(found.is_none());
}

#[test]
fn test_template_larger_than_page_reports_nothing() {
    let page = GrayImage::from_pixel(8, 8, Luma([255]));
    let found = locate(&page, &north_arrow(), &[1.0, 2.0], &[0.0], 0.1).unwrap();
    assert!(found.is_none());
}

#[test]
fn test_empty_page_is_error() {
    assert!(locate(&GrayImage::new(0, 0), &north_arrow(), &[1.0], &[0.0], 0.7).is_err());
}

#[test]
fn test_expired_deadline_marks_search_partial() {
    let page = page_with(&glyph(), 40, 30);
    let search = locate_with_deadline(&page, &north_arrow(), &[1.0], &[0.0], 0.7, Some(Instant::now())).unwrap();

    assert!(search.partial);
    assert_eq!(search.variants_tried, 0);
    assert!(search.best.is_none());
}

#[test]
fn test_flat_template_rejected() {
    let flat = GrayImage::from_pixel(10, 10, Luma([200]));
    assert!(Template::new("blank", "blank", flat).is_err());
}

// ============================================================================
// Library search
// ============================================================================

#[test]
fn test_library_only_reports_loaded_symbols() {
    let mut library = TemplateLibrary::new();
    library.insert(north_arrow());

    let matcher = SymbolMatcher::new(vec![1.0], vec![0.0], 0.7);
    let results = matcher.search_library(&page_with(&glyph(), 5, 5), &library).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results["north_arrow"].best.is_some());
    assert!(!results.contains_key("scale_bar"));
}

#[test]
fn test_library_from_dir() {
    let dir = tempfile::tempdir().unwrap();
    glyph().save(dir.path().join("north_arrow.png")).unwrap();
    imageops::rotate180(&glyph())
        .save(dir.path().join("north_arrow--flipped.png"))
        .unwrap();
    glyph().save(dir.path().join("scale_bar.png")).unwrap();
    std::fs::write(dir.path().join("README.txt"), "not an image").unwrap();

    let library = TemplateLibrary::from_dir(dir.path()).unwrap();

    assert_eq!(library.len(), 3);
    assert_eq!(library.symbols().collect::<Vec<_>>(), vec!["north_arrow", "scale_bar"]);
    let ids: Vec<&str> = library.get("north_arrow").iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec!["north_arrow", "north_arrow--flipped"]);
    assert!(library.get("sce").is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_higher_threshold_never_reports_more(low in 0.0f32..1.0, delta in 0.0f32..0.5) {
        let high = (low + delta).min(1.0);
        let page = page_with(&imageops::resize(&glyph(), 15, 15, FilterType::Triangle), 50, 40);
        let template = north_arrow();

        let at_low = locate(&page, &template, &[1.0, 1.25], &[0.0], low).unwrap();
        let at_high = locate(&page, &template, &[1.0, 1.25], &[0.0], high).unwrap();

        prop_assert!(at_low.is_some() || at_high.is_none());
        if let Some(found) = at_high {
            prop_assert!(found.confidence >= high);
        }
    }
}
