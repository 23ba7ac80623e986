// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Sheet Validator
//!
//! Visual and spatial validation of engineering drawing sheets, built on
//! recognized text plus geometric analysis of the page raster.
//!
//! ## Core Features
//!
//! - **Line Detection**: Canny edges and Hough candidates walked into finite
//!   segments, each classified solid or dashed from its gap pattern
//! - **Spatial Association**: keeps only lines near contour labels, which
//!   separates contours from streets, lot lines and borders
//! - **Contour Conventions**: existing contours dashed, proposed contours solid
//! - **Overlap Detection**: intersecting text labels with severity, plus
//!   optional filtering of recognition artifacts (rule-based or ONNX model)
//! - **Symbol Matching**: normalized cross-correlation over scale and
//!   rotation variants of reference templates
//! - **Checklist**: critical markers counted and checked against minimums
//! - **Batch Processing**: independent pages validated on a rayon pool
//!
//! ## Architecture
//!
//! ```text
//! raster ──→ LineDetector ──→ RawLines ──→ ClassifiedLines ──→ AssociationResult
//! text   ──→ PageContext ──┬─→ SpatialAssociator
//!                          ├─→ OverlapDetector ┐ concurrent
//! raster ──→ SymbolMatcher ┘                   ┘
//!                              ↓
//!                       ValidationReport
//! ```
//!
//! Character recognition is not performed here; an engine implementing
//! [`text::TextRecognizer`] supplies the text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheet_validator::config::ValidationConfig;
//! use sheet_validator::pipeline::{PageContext, ValidationOrchestrator};
//! use sheet_validator::symbols::TemplateLibrary;
//! use sheet_validator::text::{PrecomputedRecognizer, RecognitionEngines};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let page = sheet_validator::raster::load_grayscale(Path::new("sheet_03.png"))?;
//! let ocr_json = std::fs::read_to_string("sheet_03.json")?;
//! let engines = RecognitionEngines::new(Box::new(PrecomputedRecognizer::from_json("ocr", &ocr_json)?));
//! let context = PageContext::recognize("sheet_03", &page, &engines)?;
//!
//! let orchestrator = ValidationOrchestrator::new(ValidationConfig::for_dpi(150.0))?
//!     .with_templates(TemplateLibrary::from_dir(Path::new("templates"))?);
//! let report = orchestrator.validate_page(&page, &context);
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry primitives
pub mod geometry;

// Raster input
pub mod raster;

// Recognized text and engines
pub mod text;

// Label classification
pub mod labels;

// Line detection and classification
pub mod lines;

// Line-label association, conventions, proximity
pub mod association;

// Overlapping text
pub mod overlap;

// Reference symbol matching
pub mod symbols;

// Critical marker checklist
pub mod checklist;

// Per-page orchestration
pub mod pipeline;

// Learned artifact filter (optional)
#[cfg_attr(docsrs, doc(cfg(feature = "ml")))]
pub mod ml;

// Re-exports
pub use config::ValidationConfig;
pub use error::{Error, Result};
pub use pipeline::{PageContext, ValidationOrchestrator, ValidationReport};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Compare two floats, treating NaN as greater than every number.
    ///
    /// Sorting and min/max selection never panic on NaN input.
    #[inline]
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}
