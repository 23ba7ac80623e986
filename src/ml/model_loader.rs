//! ONNX model loading and inference.

use crate::error::{Error, Result};
use std::path::Path;
use tract_onnx::prelude::*;

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// An optimized ONNX model ready for CPU inference.
#[derive(Debug)]
pub struct OnnxModel {
    model: TractPlan,
    input_names: Vec<String>,
}

impl OnnxModel {
    /// Load a model from file and optimize it for CPU inference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassifierUnavailable`] if the file does not exist and
    /// [`Error::Ml`] if it cannot be parsed or optimized.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ClassifierUnavailable(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::Ml(format!("Failed to load ONNX model: {}", e)))?
            .into_optimized()
            .map_err(|e| Error::Ml(format!("Failed to optimize model: {}", e)))?
            .into_runnable()
            .map_err(|e| Error::Ml(format!("Failed to build runnable model: {}", e)))?;

        let input_names = model
            .model()
            .inputs
            .iter()
            .map(|outlet| model.model().node(outlet.node).name.clone())
            .collect();

        Ok(Self { model, input_names })
    }

    /// Run the model on a single row of `f32` features.
    ///
    /// Returns the flattened first output.
    pub fn run_row(&self, features: &[f32]) -> Result<Vec<f32>> {
        let input = tract_ndarray::Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| Error::Ml(format!("Bad input shape: {}", e)))?
            .into_tensor();

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| Error::Ml(format!("Inference failed: {}", e)))?;

        let first = outputs
            .first()
            .ok_or_else(|| Error::Ml("model produced no outputs".to_string()))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| Error::Ml(format!("Unexpected output type: {}", e)))?;
        Ok(view.iter().copied().collect())
    }

    /// Names of the model's input nodes.
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }
}
