//! Segment extraction: Canny edges, Hough candidates, edge walking.
//!
//! The Hough transform yields infinite lines in normal form
//! `x·cosθ + y·sinθ = r`. Each candidate is walked pixel by pixel across the
//! edge map; runs of edge hits separated by at most `max_line_gap` misses
//! become finite segments, and runs shorter than `min_line_length` are
//! dropped before classification.

use super::classifier::DashClassifier;
use super::{ClassifiedLines, RawLines, Segment};
use crate::config::LineDetectionConfig;
use crate::error::Result;
use crate::geometry::{point_to_segment_distance, Point};
use crate::raster;
use crate::utils::safe_float_cmp;
use image::GrayImage;
use imageproc::edges::canny;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// Two segments closer than this in angle are duplicate candidates.
const DUPLICATE_ANGLE_DEGREES: f64 = 3.0;

/// Detects straight segments and classifies them solid or dashed.
///
/// # Example
///
/// ```
/// use image::{GrayImage, Luma};
/// use sheet_validator::lines::LineDetector;
///
/// let blank = GrayImage::from_pixel(200, 100, Luma([255]));
/// let lines = LineDetector::default().detect_lines(&blank).unwrap();
/// assert!(lines.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineDetector {
    config: LineDetectionConfig,
}

impl LineDetector {
    /// Create a detector with the given parameters.
    pub fn new(config: LineDetectionConfig) -> Self {
        Self { config }
    }

    /// Parameters in use.
    pub fn config(&self) -> &LineDetectionConfig {
        &self.config
    }

    /// Detect and classify in one call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a zero-dimension raster.
    pub fn detect_lines(&self, gray: &GrayImage) -> Result<ClassifiedLines> {
        let raw = self.detect_raw(gray)?;
        Ok(self.classify(raw, gray))
    }

    /// Extract raw segments without classifying them.
    ///
    /// Output order is deterministic: segments are sorted by their first
    /// endpoint (top to bottom, then left to right).
    pub fn detect_raw(&self, gray: &GrayImage) -> Result<RawLines> {
        raster::ensure_non_empty(gray.width(), gray.height())?;

        let smoothed = raster::denoise(gray, self.config.blur_sigma);
        let edges = canny(&smoothed, self.config.canny_low, self.config.canny_high);

        let candidates = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: self.config.hough_vote_threshold,
                suppression_radius: self.config.hough_suppression_radius,
            },
        );
        log::debug!("Hough transform produced {} candidate lines", candidates.len());

        let segments: Vec<Segment> = candidates
            .iter()
            .flat_map(|candidate| self.walk_candidate(&edges, candidate))
            .collect();

        let mut segments = self.remove_duplicates(segments);
        segments.sort_by(|a, b| {
            safe_float_cmp(a.start.y, b.start.y)
                .then(safe_float_cmp(a.start.x, b.start.x))
                .then(safe_float_cmp(a.end.y, b.end.y))
                .then(safe_float_cmp(a.end.x, b.end.x))
        });

        log::debug!("Extracted {} segments", segments.len());
        Ok(RawLines::new(segments))
    }

    /// Classify raw segments against the original (unblurred) raster.
    pub fn classify(&self, raw: RawLines, gray: &GrayImage) -> ClassifiedLines {
        let classifier = DashClassifier::new(&self.config, gray);
        ClassifiedLines::new(
            raw.segments()
                .iter()
                .map(|segment| classifier.classify(segment))
                .collect(),
        )
    }

    /// Walk one Hough candidate through the edge map and cut it into runs.
    fn walk_candidate(&self, edges: &GrayImage, candidate: &PolarLine) -> Vec<Segment> {
        let (width, height) = edges.dimensions();
        let theta = (candidate.angle_in_degrees as f64).to_radians();
        let (sin, cos) = theta.sin_cos();
        let r = candidate.r as f64;

        // Step along whichever axis the line is closer to.
        let horizontal = sin.abs() >= cos.abs();
        let steps = if horizontal { width } else { height };
        let max_gap = self.config.max_line_gap as i64;

        let mut segments = Vec::new();
        let mut run: Option<((f64, f64), (f64, f64), i64)> = None;

        for step in 0..steps as i64 {
            let t = step as f64;
            let (x, y) = if horizontal {
                (t, (r - t * cos) / sin)
            } else {
                ((r - t * sin) / cos, t)
            };

            if !self.edge_near(edges, x, y, horizontal) {
                continue;
            }

            run = match run {
                Some((first, _, last_step)) if step - last_step - 1 <= max_gap => {
                    Some((first, (x, y), step))
                },
                Some((first, last, _)) => {
                    self.push_if_long(&mut segments, first, last);
                    Some(((x, y), (x, y), step))
                },
                None => Some(((x, y), (x, y), step)),
            };
        }

        if let Some((first, last, _)) = run {
            self.push_if_long(&mut segments, first, last);
        }

        segments
    }

    fn push_if_long(&self, segments: &mut Vec<Segment>, first: (f64, f64), last: (f64, f64)) {
        let segment = Segment::new(first.0, first.1, last.0, last.1);
        if segment.length() >= self.config.min_line_length as f64 {
            segments.push(segment);
        }
    }

    /// Whether an edge pixel lies within the perpendicular tolerance of
    /// `(x, y)`.
    fn edge_near(&self, edges: &GrayImage, x: f64, y: f64, horizontal: bool) -> bool {
        let (width, height) = edges.dimensions();
        let tol = self.config.edge_tolerance as i64;
        let (cx, cy) = (x.round() as i64, y.round() as i64);

        (-tol..=tol).any(|offset| {
            let (px, py) = if horizontal {
                (cx, cy + offset)
            } else {
                (cx + offset, cy)
            };
            px >= 0
                && py >= 0
                && px < width as i64
                && py < height as i64
                && edges.get_pixel(px as u32, py as u32)[0] > 0
        })
    }

    /// Keep the longest of near-identical segments.
    ///
    /// Both borders of a thick stroke can survive non-maximum suppression;
    /// they describe the same drawn line. A shorter segment whose endpoints
    /// both lie within the suppression radius of a longer one is a slanted
    /// Hough neighbour cutting across the same stroke and is dropped too.
    fn remove_duplicates(&self, mut segments: Vec<Segment>) -> Vec<Segment> {
        segments.sort_by(|a, b| safe_float_cmp(b.length(), a.length()));

        let radius = self.config.hough_suppression_radius.max(1) as f64;
        let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());

        for segment in segments {
            let duplicate = kept.iter().any(|existing| {
                let near =
                    |p: &Point| point_to_segment_distance(p, &existing.start, &existing.end) <= radius;
                let parallel = angle_difference(existing.angle_degrees(), segment.angle_degrees())
                    <= DUPLICATE_ANGLE_DEGREES;
                (parallel && near(&segment.midpoint())) || (near(&segment.start) && near(&segment.end))
            });
            if !duplicate {
                kept.push(segment);
            }
        }

        kept
    }
}

/// Smallest difference between two undirected line angles, `[0, 90]`.
pub(crate) fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 180.0;
    diff.min(180.0 - diff)
}
