//! Reference symbol matching.
//!
//! Symbols such as north arrows are located by normalized cross-correlation
//! of reference templates over a set of scale and rotation variants. Absence
//! of a symbol is an ordinary outcome: most sheets legitimately lack some.

pub mod matcher;
pub mod ncc;
pub mod templates;

pub use matcher::{locate, locate_best, locate_with_deadline, template_variant, SymbolMatcher};
pub use templates::{Template, TemplateLibrary};

use crate::geometry::Point;
use serde::Serialize;

/// Best pose of a template in an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMatch {
    /// Template that produced the match
    pub template_id: String,
    /// Symbol type of the template
    pub symbol: String,
    /// Top-left corner of the matched window
    pub location: (u32, u32),
    /// Size of the resampled template
    pub size: (u32, u32),
    /// Scale factor applied to the template
    pub scale: f32,
    /// Clockwise rotation applied to the template
    pub rotation_degrees: f32,
    /// Raw correlation, `[-1, 1]`
    #[serde(skip)]
    pub score: f32,
    /// Correlation clamped to `[0, 1]`
    pub confidence: f32,
}

impl SymbolMatch {
    /// Center of the matched window.
    pub fn center(&self) -> Point {
        Point::new(
            self.location.0 as f64 + self.size.0 as f64 / 2.0,
            self.location.1 as f64 + self.size.1 as f64 / 2.0,
        )
    }
}

/// Outcome of searching for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolSearch {
    /// Best match at or above the threshold
    pub best: Option<SymbolMatch>,
    /// Highest confidence seen, reported or not; `None` when no variant fit
    pub best_confidence: Option<f32>,
    /// Variants actually correlated
    pub variants_tried: usize,
    /// True when a deadline cut the enumeration short
    pub partial: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_center() {
        let m = SymbolMatch {
            template_id: "north_arrow".to_string(),
            symbol: "north_arrow".to_string(),
            location: (10, 20),
            size: (6, 8),
            scale: 1.0,
            rotation_degrees: 0.0,
            score: 0.9,
            confidence: 0.9,
        };
        assert_eq!(m.center(), Point::new(13.0, 24.0));
    }
}
