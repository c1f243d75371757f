//! Scoring artifact loader

use crate::config::{ArtifactsConfig, ClassifierFormat};
use crate::feature_extractor::FeatureVector;
use crate::models::classifier::{Classifier, ClassifierArtifact, LogisticRegression};
use crate::models::scaler::{MinMaxScaler, Scaler, ScalerArtifact, StandardScaler};
use crate::types::features::FEATURE_NAMES;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

/// The fitted scaler and classifier, loaded once and shared read-only.
pub struct ScoringArtifacts {
    pub scaler: Box<dyn Scaler>,
    pub classifier: Box<dyn Classifier>,
}

impl ScoringArtifacts {
    pub fn new(scaler: Box<dyn Scaler>, classifier: Box<dyn Classifier>) -> Self {
        Self { scaler, classifier }
    }
}

/// Loader for scaler and classifier artifacts
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new loader with the given ONNX thread count
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self { onnx_threads }
    }

    /// Load both artifacts described by the configuration.
    pub fn load(&self, config: &ArtifactsConfig) -> Result<ScoringArtifacts> {
        let scaler = self.load_scaler(&config.scaler_path)?;
        let classifier = self.load_classifier(&config.classifier_path, config.classifier_format)?;

        info!(
            scaler = scaler.kind(),
            classifier = classifier.name(),
            "Scoring artifacts loaded"
        );

        Ok(ScoringArtifacts::new(scaler, classifier))
    }

    /// Load a scaler from a JSON artifact.
    pub fn load_scaler<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn Scaler>> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading scaler");

        let artifact: ScalerArtifact = read_json(path)?;
        check_feature_names(artifact.feature_names())
            .context(format!("Scaler artifact {:?} does not match the feature schema", path))?;

        let scaler: Box<dyn Scaler> = match artifact {
            ScalerArtifact::MinMax {
                scale,
                min,
                data_min,
                data_max,
                ..
            } => {
                let scaler = MinMaxScaler::new(
                    to_feature_vector("scale", scale)?,
                    to_feature_vector("min", min)?,
                );
                if let (Some(data_min), Some(data_max)) = (data_min, data_max) {
                    let fitted = MinMaxScaler::from_bounds(
                        to_feature_vector("data_min", data_min)?,
                        to_feature_vector("data_max", data_max)?,
                    );
                    if let Some(i) = scaler.mismatch(&fitted) {
                        anyhow::bail!(
                            "Scaler artifact {:?}: `scale`/`min` disagree with the data bounds of {}",
                            path,
                            FEATURE_NAMES[i]
                        );
                    }
                }
                Box::new(scaler)
            }
            ScalerArtifact::Standard { mean, scale, .. } => Box::new(StandardScaler::new(
                to_feature_vector("mean", mean)?,
                to_feature_vector("scale", scale)?,
            )),
        };

        Ok(scaler)
    }

    /// Load a classifier in the given format.
    pub fn load_classifier<P: AsRef<Path>>(
        &self,
        path: P,
        format: ClassifierFormat,
    ) -> Result<Box<dyn Classifier>> {
        let path = path.as_ref();
        info!(path = %path.display(), format = ?format, "Loading classifier");

        match format {
            ClassifierFormat::Json => self.load_json_classifier(path),
            ClassifierFormat::Onnx => self.load_onnx_classifier(path),
        }
    }

    fn load_json_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let artifact: ClassifierArtifact = read_json(path)?;
        check_feature_names(artifact.feature_names()).context(format!(
            "Classifier artifact {:?} does not match the feature schema",
            path
        ))?;

        match artifact {
            ClassifierArtifact::LogisticRegression {
                coef,
                intercept,
                classes,
                ..
            } => {
                if classes != [0, 1] {
                    anyhow::bail!("Classifier {:?} has classes {:?}, expected [0, 1]", path, classes);
                }
                if !intercept.is_finite() {
                    anyhow::bail!("Classifier {:?} has a non-finite intercept", path);
                }
                Ok(Box::new(LogisticRegression::new(
                    to_feature_vector("coef", coef)?,
                    intercept,
                )))
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let classifier = crate::models::onnx::OnnxClassifier::load(path, self.onnx_threads)?;
        Ok(Box::new(classifier))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        anyhow::bail!("Cannot load {:?}: built without the `onnx` feature", path)
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .context(format!("Failed to read artifact from {:?}", path))?;
    serde_json::from_str(&raw).context(format!("Failed to parse artifact {:?}", path))
}

/// Artifacts must list the schema's features in the same order.
fn check_feature_names(names: &[String]) -> Result<()> {
    if names.len() != FEATURE_NAMES.len() {
        anyhow::bail!(
            "expected {} features, found {}",
            FEATURE_NAMES.len(),
            names.len()
        );
    }
    for (i, (found, expected)) in names.iter().zip(FEATURE_NAMES.iter()).enumerate() {
        if found != expected {
            anyhow::bail!("feature {} is {:?}, expected {:?}", i, found, expected);
        }
    }
    Ok(())
}

fn to_feature_vector(name: &str, values: Vec<f64>) -> Result<FeatureVector> {
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        anyhow::bail!("`{}` has a non-finite value at index {}", name, i);
    }
    let len = values.len();
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("`{}` has {} values, expected {}", name, len, FEATURE_NAMES.len()))
}
