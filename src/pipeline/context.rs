//! Per-page recognition context.

use crate::error::Result;
use crate::text::{filter_noise, Recognition, RecognitionEngines, TextElement};
use image::GrayImage;

/// Recognized text for one page, computed once and shared read-only by
/// every phase.
///
/// A context lives for one page; dropping it discards the recognition
/// results whether validation succeeded or not.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    page_id: String,
    elements: Vec<TextElement>,
    engine: String,
    used_fallback: bool,
}

impl PageContext {
    /// Context from already-recognized text.
    pub fn new(page_id: impl Into<String>, elements: Vec<TextElement>, engine: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            elements,
            engine: engine.into(),
            used_fallback: false,
        }
    }

    /// Context from a recognition result, with noise regions removed.
    pub fn from_recognition(page_id: impl Into<String>, recognition: Recognition) -> Self {
        Self {
            page_id: page_id.into(),
            elements: filter_noise(recognition.elements),
            engine: recognition.engine,
            used_fallback: recognition.used_fallback,
        }
    }

    /// Run recognition on a page raster.
    pub fn recognize(page_id: impl Into<String>, image: &GrayImage, engines: &RecognitionEngines) -> Result<Self> {
        Ok(Self::from_recognition(page_id, engines.recognize(image)?))
    }

    /// Page identifier.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Recognized text.
    pub fn elements(&self) -> &[TextElement] {
        &self.elements
    }

    /// Engine that produced the text.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// True when the fallback engine was used.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }
}
