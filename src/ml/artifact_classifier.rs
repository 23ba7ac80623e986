//! ONNX-backed overlap artifact filter.

use crate::error::{Error, Result};
use crate::ml::model_loader::OnnxModel;
use crate::overlap::artifact::{ArtifactFeatures, OverlapArtifactFilter, FEATURE_COUNT};
use crate::overlap::OverlapIssue;
use std::path::Path;

/// Scores overlaps with a binary classifier over [`ArtifactFeatures`].
///
/// The model takes a `[1, 6]` feature row and returns either a single
/// artifact probability or a two-class distribution whose last entry is the
/// artifact class.
#[derive(Debug)]
pub struct ModelArtifactFilter {
    model: OnnxModel,
}

impl ModelArtifactFilter {
    /// Load the classifier from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let model = OnnxModel::load_from_file(path)?;
        log::info!(
            "Artifact classifier loaded from {} (inputs: {:?})",
            path.display(),
            model.input_names()
        );
        Ok(Self { model })
    }
}

impl OverlapArtifactFilter for ModelArtifactFilter {
    fn artifact_score(&self, issue: &OverlapIssue) -> Result<f32> {
        let features: [f32; FEATURE_COUNT] = ArtifactFeatures::from_issue(issue).to_vec();
        let output = self
            .model
            .run_row(&features)
            .map_err(|e| Error::ClassifierUnavailable(e.to_string()))?;

        output
            .last()
            .map(|p| p.clamp(0.0, 1.0))
            .ok_or_else(|| Error::ClassifierUnavailable("empty model output".to_string()))
    }

    fn name(&self) -> &'static str {
        "onnx_model"
    }
}
