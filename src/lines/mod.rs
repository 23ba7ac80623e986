//! Straight-line detection and solid/dashed classification.
//!
//! Detection runs in two stages whose output types enforce the order:
//!
//! ```text
//! GrayImage ──detect_raw──▶ RawLines ──classify──▶ ClassifiedLines
//! ```
//!
//! Only [`ClassifiedLines`] is accepted by the spatial associator, so
//! association can never run on unclassified segments.

pub mod classifier;
pub mod detector;
pub mod grouping;

pub use detector::LineDetector;
pub use grouping::{group_parallel_lines, LineGroup};

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Stroke pattern of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Continuous stroke
    Solid,
    /// Stroke interrupted by regular gaps
    Dashed,
}

/// A finite straight segment in image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint
    pub start: Point,
    /// Second endpoint
    pub end: Point,
}

impl Segment {
    /// Create a segment from endpoint coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            start: Point::new(x1, y1),
            end: Point::new(x2, y2),
        }
    }

    /// Midpoint.
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Direction angle in degrees, `(-180, 180]`.
    pub fn angle_degrees(&self) -> f64 {
        (self.end.y - self.start.y)
            .atan2(self.end.x - self.start.x)
            .to_degrees()
    }
}

/// A classified line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Geometry
    pub segment: Segment,
    /// Solid or dashed
    pub kind: LineKind,
    /// Agreement of the gap pattern along the line, `[0, 1]`
    pub confidence: f64,
}

impl Line {
    /// Create a line; confidence is clamped to `[0, 1]`.
    pub fn new(segment: Segment, kind: LineKind, confidence: f64) -> Self {
        Self {
            segment,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Midpoint of the underlying segment.
    pub fn midpoint(&self) -> Point {
        self.segment.midpoint()
    }

    /// Length of the underlying segment.
    pub fn length(&self) -> f64 {
        self.segment.length()
    }
}

/// Segments straight out of the detector, not yet classified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLines(Vec<Segment>);

impl RawLines {
    /// Wrap detected segments.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Detected segments.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was detected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lines that went through solid/dashed classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifiedLines(Vec<Line>);

impl ClassifiedLines {
    /// Wrap already classified lines.
    pub fn new(lines: Vec<Line>) -> Self {
        Self(lines)
    }

    /// Classified lines in detection order.
    pub fn lines(&self) -> &[Line] {
        &self.0
    }

    /// Consume into the inner vector.
    pub fn into_inner(self) -> Vec<Line> {
        self.0
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count of lines with the given kind.
    pub fn count_kind(&self, kind: LineKind) -> usize {
        self.0.iter().filter(|l| l.kind == kind).count()
    }
}
