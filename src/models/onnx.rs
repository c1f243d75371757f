//! ONNX Runtime classifier backend (`onnx` feature)

use crate::feature_extractor::FeatureVector;
use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Classifier exported to ONNX (e.g. with skl2onnx).
///
/// Running a session needs exclusive access, so the session sits behind a mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    label_output: Option<String>,
    proba_output: String,
}

impl OnnxClassifier {
    /// Load a model from file.
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), threads = threads, "Loading ONNX classifier");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load ONNX model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let proba_output = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            input = %input_name,
            label = ?label_output,
            probabilities = %proba_output,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            proba_output,
        })
    }

    fn probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        let output = outputs
            .get(self.proba_output.as_str())
            .context(format!("Missing output {:?}", self.proba_output))?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_class_from_tensor(&dims, data);
        }

        // seq(map(int64, float)), the skl2onnx default with ZipMap
        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return positive_class_from_sequence_map(output);
        }

        anyhow::bail!("Unsupported probability output {:?}", self.proba_output)
    }

    fn label(&self, outputs: &SessionOutputs, probability: f64) -> Result<u8> {
        let Some(name) = &self.label_output else {
            return Ok(u8::from(probability > 0.5));
        };
        let output = outputs
            .get(name.as_str())
            .context(format!("Missing output {:?}", name))?;
        let (_, data) = output.try_extract_tensor::<i64>()?;
        match data.first().copied() {
            Some(1) => Ok(1),
            Some(0) => Ok(0),
            other => anyhow::bail!("Unexpected label {:?}", other),
        }
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(self.classify(features)?.0)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        Ok(self.classify(features)?.1)
    }

    fn classify(&self, features: &FeatureVector) -> Result<(u8, f64)> {
        let input: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, input.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, input)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let probability = self.probability(&outputs)?;
        let label = self.label(&outputs, probability)?;

        debug!(label = label, probability = probability, "ONNX inference complete");

        Ok((label, probability))
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Class-1 probability from a `[batch, classes]`, `[classes]` or `[batch, 1]` tensor.
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    let value = match classes {
        c if c >= 2 => data.get(1),
        1 => data.first(),
        _ => None,
    };
    value
        .map(|&v| v as f64)
        .context(format!("Empty probability tensor with shape {:?}", dims))
}

/// Class-1 probability from a seq(map(int64, float)) output.
fn positive_class_from_sequence_map(output: &DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps.first().context("Empty probability sequence")?;
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(*p as f64);
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *p as f64);
    }
    anyhow::bail!("No class probability in map output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_class_from_tensor() {
        assert_eq!(positive_class_from_tensor(&[1, 2], &[0.25, 0.75]).unwrap(), 0.75);
        assert_eq!(positive_class_from_tensor(&[2], &[0.5, 0.5]).unwrap(), 0.5);
        assert_eq!(positive_class_from_tensor(&[1, 1], &[0.125]).unwrap(), 0.125);
        assert!(positive_class_from_tensor(&[1, 0], &[]).is_err());
    }
}
