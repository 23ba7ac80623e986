//! Learned overlap-artifact filter (optional).
//!
//! Gated behind the `ml` feature. Models are ONNX graphs run on CPU with
//! tract; any load or inference failure degrades to the rule-based filter.
//!
//! # Example
//!
//! ```ignore
//! use sheet_validator::ml::ModelArtifactFilter;
//! use std::path::Path;
//!
//! let filter = ModelArtifactFilter::load(Path::new("models/overlap_artifact.onnx"))?;
//! ```

#[cfg(feature = "ml")]
pub mod artifact_classifier;
#[cfg(feature = "ml")]
pub mod model_loader;

#[cfg(feature = "ml")]
pub use artifact_classifier::ModelArtifactFilter;
#[cfg(feature = "ml")]
pub use model_loader::OnnxModel;
