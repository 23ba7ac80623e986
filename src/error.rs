//! Error types for the sheet validator.
//!
//! Only conditions that stop an operation outright are errors. A search that
//! finds nothing returns an empty result, and degraded filtering is a flag on
//! the result it produced.

/// Result type alias for validator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while validating a sheet.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Raster or recognition input that cannot be processed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reference template that cannot be matched against anything
    #[error("Invalid template '{id}': {reason}")]
    InvalidTemplate {
        /// Symbol type the template was registered for
        id: String,
        /// Why the template was rejected
        reason: String,
    },

    /// Trained classifier could not be loaded or invoked
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// No text recognition engine could be initialised
    #[error("Text recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    /// Configuration value out of its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ML model error
    #[cfg(feature = "ml")]
    #[error("ML error: {0}")]
    Ml(String),
}
