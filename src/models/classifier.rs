//! Fitted binary classifiers

use crate::feature_extractor::FeatureVector;
use anyhow::Result;
use serde::Deserialize;

/// A fitted binary classifier over scaled feature vectors.
///
/// Class 1 is the default (positive) class.
pub trait Classifier: Send + Sync {
    /// Predicted label, 0 or 1.
    fn predict(&self, features: &FeatureVector) -> Result<u8>;

    /// Probability of class 1.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64>;

    /// Label and class-1 probability in one call.
    fn classify(&self, features: &FeatureVector) -> Result<(u8, f64)> {
        Ok((self.predict(features)?, self.predict_proba(features)?))
    }

    /// Model name for logs.
    fn name(&self) -> &str;
}

/// Serialized classifier artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression {
        feature_names: Vec<String>,
        coef: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_classes")]
        classes: Vec<i64>,
    },
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

impl ClassifierArtifact {
    pub fn feature_names(&self) -> &[String] {
        match self {
            ClassifierArtifact::LogisticRegression { feature_names, .. } => feature_names,
        }
    }
}

/// Binary logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    coef: FeatureVector,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coef: FeatureVector, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    /// Signed distance to the decision boundary, summed in feature order.
    pub fn decision_function(&self, features: &FeatureVector) -> f64 {
        let mut z = 0.0;
        for (c, x) in self.coef.iter().zip(features.iter()) {
            z += c * x;
        }
        z + self.intercept
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        Ok(u8::from(self.decision_function(features) > 0.0))
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64> {
        Ok(sigmoid(self.decision_function(features)))
    }

    fn classify(&self, features: &FeatureVector) -> Result<(u8, f64)> {
        let z = self.decision_function(features);
        Ok((u8::from(z > 0.0), sigmoid(z)))
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
