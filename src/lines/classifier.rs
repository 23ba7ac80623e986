//! Solid/dashed classification by perpendicular slice sampling.

use super::{Line, LineKind, Segment};
use crate::config::LineDetectionConfig;
use crate::raster::background_level;
use image::GrayImage;

/// Slices per agreement window.
const SLICES_PER_WINDOW: usize = 10;
/// Upper bound on agreement windows per line.
const MAX_WINDOWS: usize = 8;

/// Classifies segments against one raster.
///
/// Along the segment, a perpendicular slice is sampled every
/// `sample_spacing` pixels. A slice is *ink* when any of its pixels differs
/// from the sheet background by more than `ink_contrast`; otherwise it is a
/// *gap*. A segment whose gap fraction exceeds `dash_gap_threshold` is
/// dashed.
///
/// Confidence is the fraction of consecutive slice windows whose own
/// classification agrees with the whole-segment result, so an evenly
/// dashed or cleanly solid stroke scores 1.0 and a stroke that is solid in
/// one half and broken in the other scores lower.
pub struct DashClassifier<'a> {
    config: &'a LineDetectionConfig,
    gray: &'a GrayImage,
    background: u8,
}

impl<'a> DashClassifier<'a> {
    /// Prepare a classifier, estimating the sheet background once.
    pub fn new(config: &'a LineDetectionConfig, gray: &'a GrayImage) -> Self {
        Self {
            config,
            gray,
            background: background_level(gray),
        }
    }

    /// Classify one segment.
    pub fn classify(&self, segment: &Segment) -> Line {
        let slices = self.sample_slices(segment);
        if slices.is_empty() {
            return Line::new(*segment, LineKind::Solid, 0.0);
        }

        let kind = self.kind_of(&slices);

        let windows = (slices.len() / SLICES_PER_WINDOW).clamp(1, MAX_WINDOWS);
        let window_len = slices.len().div_ceil(windows);
        let chunks: Vec<&[bool]> = slices.chunks(window_len).collect();
        let agreeing = chunks.iter().filter(|c| self.kind_of(c) == kind).count();
        let confidence = agreeing as f64 / chunks.len() as f64;

        Line::new(*segment, kind, confidence)
    }

    /// Fraction of gap slices along a segment.
    pub fn gap_ratio(&self, segment: &Segment) -> f64 {
        gap_fraction(&self.sample_slices(segment))
    }

    fn kind_of(&self, slices: &[bool]) -> LineKind {
        if gap_fraction(slices) > self.config.dash_gap_threshold {
            LineKind::Dashed
        } else {
            LineKind::Solid
        }
    }

    /// One entry per slice: `true` for ink, `false` for gap.
    fn sample_slices(&self, segment: &Segment) -> Vec<bool> {
        let length = segment.length();
        if length == 0.0 {
            return Vec::new();
        }

        let dx = (segment.end.x - segment.start.x) / length;
        let dy = (segment.end.y - segment.start.y) / length;
        let (nx, ny) = (-dy, dx);

        let spacing = self.config.sample_spacing.max(1) as f64;
        let count = (length / spacing).floor() as usize + 1;
        let half = self.config.slice_half_width as i64;

        (0..count)
            .map(|i| {
                let t = i as f64 * spacing;
                let (px, py) = (segment.start.x + t * dx, segment.start.y + t * dy);
                (-half..=half).any(|k| {
                    let k = k as f64;
                    self.is_ink((px + k * nx).round(), (py + k * ny).round())
                })
            })
            .collect()
    }

    fn is_ink(&self, x: f64, y: f64) -> bool {
        if x < 0.0 || y < 0.0 || x >= self.gray.width() as f64 || y >= self.gray.height() as f64 {
            return false;
        }
        let value = self.gray.get_pixel(x as u32, y as u32)[0];
        value.abs_diff(self.background) > self.config.ink_contrast
    }
}

fn gap_fraction(slices: &[bool]) -> f64 {
    if slices.is_empty() {
        return 0.0;
    }
    slices.iter().filter(|ink| !**ink).count() as f64 / slices.len() as f64
}
