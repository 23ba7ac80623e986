//! Benchmarks for the raster-heavy validation phases.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::imageops;
use image::{GrayImage, Luma};
use sheet_validator::geometry::BoundingBox;
use sheet_validator::lines::LineDetector;
use sheet_validator::overlap::{detect_overlaps, Severity};
use sheet_validator::symbols::{locate, Template};
use sheet_validator::text::TextElement;

fn glyph() -> GrayImage {
    GrayImage::from_fn(16, 16, |x, y| {
        let ink = (x < 4 && y < 14) || ((10..14).contains(&y) && x < 12);
        Luma([if ink { 0 } else { 255 }])
    })
}

fn contour_sheet() -> GrayImage {
    let mut page = GrayImage::from_pixel(1000, 800, Luma([255]));
    for row in 0..8u32 {
        let y = 60 + row * 90;
        let (on, off) = if row % 2 == 0 { (900, 0) } else { (14, 8) };
        let mut x = 50;
        while x < 950 {
            for dx in 0..on.min(950 - x) {
                page.put_pixel(x + dx, y, Luma([0]));
                page.put_pixel(x + dx, y + 1, Luma([0]));
            }
            x += on + off;
        }
    }
    page
}

fn crowded_labels(count: i32) -> Vec<TextElement> {
    (0..count)
        .map(|i| {
            let bbox = BoundingBox::new((i * 37) % 900, (i * 23) % 700, 60, 14);
            TextElement::new(format!("{}", 100 + i), bbox, 90.0)
        })
        .collect()
}

fn bench_line_detection(c: &mut Criterion) {
    let page = contour_sheet();
    let detector = LineDetector::default();
    c.bench_function("detect_lines_1000x800", |b| {
        b.iter(|| detector.detect_lines(black_box(&page)))
    });
}

fn bench_symbol_search(c: &mut Criterion) {
    let mut page = GrayImage::from_pixel(400, 300, Luma([255]));
    imageops::replace(&mut page, &glyph(), 250, 120);
    let template = Template::new("north_arrow", "north_arrow", glyph()).expect("glyph has contrast");
    let scales = [0.75, 1.0, 1.25];
    let rotations = [0.0, 90.0, 180.0, 270.0];

    c.bench_function("locate_12_variants_400x300", |b| {
        b.iter(|| locate(black_box(&page), &template, &scales, &rotations, 0.7))
    });
}

fn bench_overlaps(c: &mut Criterion) {
    let labels = crowded_labels(400);
    c.bench_function("detect_overlaps_400_labels", |b| {
        b.iter(|| detect_overlaps(black_box(&labels), 40.0, Severity::Minor))
    });
}

criterion_group!(benches, bench_line_detection, bench_symbol_search, bench_overlaps);
criterion_main!(benches);
