//! Text recognition engine selection.
//!
//! Engines are black boxes behind [`TextRecognizer`]. [`RecognitionEngines`]
//! pairs a primary engine with a fallback and records which one produced
//! the page's text.

use super::{filter_noise, TextElement};
use crate::error::{Error, Result};
use image::GrayImage;

/// A text recognition engine.
pub trait TextRecognizer: Send + Sync {
    /// Engine name recorded in reports.
    fn name(&self) -> &str;

    /// Whether the engine can run in this environment.
    fn is_available(&self) -> bool {
        true
    }

    /// Recognize every text region in a page raster.
    fn recognize(&self, image: &GrayImage) -> Result<Vec<TextElement>>;
}

/// Engine returning text recognized ahead of time, e.g. loaded from an
/// upstream recognition pass.
#[derive(Debug, Clone)]
pub struct PrecomputedRecognizer {
    name: String,
    elements: Vec<TextElement>,
}

impl PrecomputedRecognizer {
    /// Wrap previously recognized elements under an engine name.
    pub fn new(name: impl Into<String>, elements: Vec<TextElement>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    /// Parse elements from a JSON array of `{text, bbox, confidence}`.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let elements: Vec<TextElement> = serde_json::from_str(json)?;
        Ok(Self::new(name, elements))
    }
}

impl TextRecognizer for PrecomputedRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, _image: &GrayImage) -> Result<Vec<TextElement>> {
        Ok(self.elements.clone())
    }
}

/// Recognized text for one page, tagged with the engine that produced it.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Elements with noise regions removed
    pub elements: Vec<TextElement>,
    /// Name of the engine that produced them
    pub engine: String,
    /// True when the primary engine was skipped or failed
    pub used_fallback: bool,
}

/// Primary engine with an optional fallback.
pub struct RecognitionEngines {
    primary: Box<dyn TextRecognizer>,
    fallback: Option<Box<dyn TextRecognizer>>,
}

impl RecognitionEngines {
    /// Use a single engine with no fallback.
    pub fn new(primary: Box<dyn TextRecognizer>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Add a fallback engine used when the primary is unavailable or fails.
    pub fn with_fallback(mut self, fallback: Box<dyn TextRecognizer>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Recognize a page, falling back when the primary engine cannot run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecognitionUnavailable`] when neither engine
    /// produced a result.
    pub fn recognize(&self, image: &GrayImage) -> Result<Recognition> {
        let primary_failure = if self.primary.is_available() {
            match self.primary.recognize(image) {
                Ok(elements) => {
                    log::debug!(
                        "{} recognized {} text regions",
                        self.primary.name(),
                        elements.len()
                    );
                    return Ok(Recognition {
                        elements: filter_noise(elements),
                        engine: self.primary.name().to_string(),
                        used_fallback: false,
                    });
                },
                Err(e) => format!("{} failed: {}", self.primary.name(), e),
            }
        } else {
            format!("{} is not available", self.primary.name())
        };

        let Some(fallback) = &self.fallback else {
            return Err(Error::RecognitionUnavailable(primary_failure));
        };

        log::warn!("{}", primary_failure);
        log::warn!("Falling back to {} for text recognition", fallback.name());

        if !fallback.is_available() {
            return Err(Error::RecognitionUnavailable(format!(
                "{}; fallback {} is not available",
                primary_failure,
                fallback.name()
            )));
        }

        let elements = fallback.recognize(image).map_err(|e| {
            Error::RecognitionUnavailable(format!(
                "{}; fallback {} failed: {}",
                primary_failure,
                fallback.name(),
                e
            ))
        })?;

        Ok(Recognition {
            elements: filter_noise(elements),
            engine: fallback.name().to_string(),
            used_fallback: true,
        })
    }
}
