//! Recognized text and the recognition engine boundary.
//!
//! The validator never performs character recognition itself. An engine
//! implementing [`TextRecognizer`] hands back [`TextElement`]s; everything
//! downstream reads them immutably.

pub mod recognition;
pub mod similarity;

pub use recognition::{PrecomputedRecognizer, Recognition, RecognitionEngines, TextRecognizer};
pub use similarity::{levenshtein, similarity_ratio};

use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};

/// Regions narrower or shorter than this are recognition noise.
pub const MIN_REGION_SIDE: u32 = 5;

/// A single recognized text region.
///
/// Fields are private: once produced by a recognition engine an element is
/// never modified. Confidence is clamped to `[0, 100]` at construction.
///
/// # Examples
///
/// ```
/// use sheet_validator::geometry::BoundingBox;
/// use sheet_validator::text::TextElement;
///
/// let element = TextElement::new("SCE", BoundingBox::new(10, 10, 40, 12), 120.0);
/// assert_eq!(element.text(), "SCE");
/// assert_eq!(element.confidence(), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TextElementRecord")]
pub struct TextElement {
    text: String,
    bbox: BoundingBox,
    confidence: f32,
}

#[derive(Deserialize)]
struct TextElementRecord {
    text: String,
    bbox: BoundingBox,
    confidence: f32,
}

impl From<TextElementRecord> for TextElement {
    fn from(record: TextElementRecord) -> Self {
        TextElement::new(record.text, record.bbox, record.confidence)
    }
}

impl TextElement {
    /// Create an element with a confidence on the 0-100 scale.
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 100.0)
        };
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }

    /// Create an element from an engine that reports confidence in `[0, 1]`.
    pub fn from_unit_confidence(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self::new(text, bbox, confidence * 100.0)
    }

    /// Recognized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Pixel bounding box.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Recognition confidence, 0-100.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// True for regions too small to hold a legible glyph.
    pub fn is_noise(&self) -> bool {
        self.bbox.width < MIN_REGION_SIDE || self.bbox.height < MIN_REGION_SIDE
    }
}

/// Drop empty and undersized regions, preserving order.
pub fn filter_noise(elements: Vec<TextElement>) -> Vec<TextElement> {
    elements
        .into_iter()
        .filter(|e| !e.is_noise() && !e.text.trim().is_empty())
        .collect()
}
