//! Fitted feature scalers

use crate::feature_extractor::FeatureVector;
use crate::types::features::FEATURE_COUNT;
use serde::Deserialize;

/// A fitted, stateless transform applied to every feature vector before classification.
pub trait Scaler: Send + Sync {
    /// Rescale a raw feature vector.
    fn transform(&self, features: &FeatureVector) -> FeatureVector;

    /// Short name for logs.
    fn kind(&self) -> &'static str;
}

/// Serialized scaler artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    /// Min-max scaling, stored as the fitted `scale` and `min` offsets,
    /// optionally with the data bounds they were fit from
    MinMax {
        feature_names: Vec<String>,
        scale: Vec<f64>,
        min: Vec<f64>,
        #[serde(default)]
        data_min: Option<Vec<f64>>,
        #[serde(default)]
        data_max: Option<Vec<f64>>,
    },
    /// Standardization, stored as the fitted `mean` and `scale`
    Standard {
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl ScalerArtifact {
    pub fn feature_names(&self) -> &[String] {
        match self {
            ScalerArtifact::MinMax { feature_names, .. }
            | ScalerArtifact::Standard { feature_names, .. } => feature_names,
        }
    }
}

/// Min-max scaler: `x * scale + min` per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    scale: FeatureVector,
    min: FeatureVector,
}

impl MinMaxScaler {
    pub fn new(scale: FeatureVector, min: FeatureVector) -> Self {
        Self { scale, min }
    }

    /// Fit from per-feature data bounds onto the `[0, 1]` range.
    ///
    /// A constant feature (`max == min`) gets a scale of 1.
    pub fn from_bounds(data_min: FeatureVector, data_max: FeatureVector) -> Self {
        let mut scale = [0.0; FEATURE_COUNT];
        let mut min = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let range = data_max[i] - data_min[i];
            scale[i] = if range == 0.0 { 1.0 } else { 1.0 / range };
            min[i] = -data_min[i] * scale[i];
        }
        Self { scale, min }
    }

    /// Index of the first feature whose parameters differ from `other`
    /// beyond float noise.
    pub fn mismatch(&self, other: &MinMaxScaler) -> Option<usize> {
        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()));
        (0..FEATURE_COUNT)
            .find(|&i| !close(self.scale[i], other.scale[i]) || !close(self.min[i], other.min[i]))
    }
}

impl Scaler for MinMaxScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = *features;
        for (i, value) in out.iter_mut().enumerate() {
            *value = *value * self.scale[i] + self.min[i];
        }
        out
    }

    fn kind(&self) -> &'static str {
        "min_max"
    }
}

/// Standard scaler: `(x - mean) / scale` per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: FeatureVector,
    scale: FeatureVector,
}

impl StandardScaler {
    /// A zero scale is replaced by 1 so constant features pass through centered.
    pub fn new(mean: FeatureVector, mut scale: FeatureVector) -> Self {
        for s in scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Self { mean, scale }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = *features;
        for (i, value) in out.iter_mut().enumerate() {
            *value = (*value - self.mean[i]) / self.scale[i];
        }
        out
    }

    fn kind(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA_MIN: FeatureVector = [0.0, 0.0, 0.0, 0.0, 0.0, 150.0, 0.0, 9.0, 12.0, 0.0, 0.0];
    const DATA_MAX: FeatureVector = [
        1.0, 1.0, 3.0, 1.0, 1.0, 81000.0, 41667.0, 700.0, 480.0, 1.0, 2.0,
    ];

    #[test]
    fn test_min_max_maps_bounds_to_unit_range() {
        let scaler = MinMaxScaler::from_bounds(DATA_MIN, DATA_MAX);

        let low = scaler.transform(&DATA_MIN);
        let high = scaler.transform(&DATA_MAX);

        for i in 0..FEATURE_COUNT {
            assert!(low[i].abs() < 1e-12, "feature {i}: {}", low[i]);
            assert!((high[i] - 1.0).abs() < 1e-12, "feature {i}: {}", high[i]);
        }
    }

    #[test]
    fn test_min_max_constant_feature() {
        let mut data_max = DATA_MAX;
        data_max[0] = 0.0;
        let scaler = MinMaxScaler::from_bounds(DATA_MIN, data_max);

        let mut x = DATA_MIN;
        x[0] = 3.0;
        assert_eq!(scaler.transform(&x)[0], 3.0);
    }

    #[test]
    fn test_mismatch() {
        let fitted = MinMaxScaler::from_bounds(DATA_MIN, DATA_MAX);
        let mut scale = [1.0; FEATURE_COUNT];
        let mut min = [0.0; FEATURE_COUNT];
        scale[7] = 1.0 / 691.0;
        min[7] = -9.0 / 691.0;
        scale[2] = 1.0 / 3.0;
        scale[10] = 0.5;
        scale[5] = 1.0 / 80850.0;
        min[5] = -150.0 / 80850.0;
        scale[6] = 1.0 / 41667.0;
        scale[8] = 1.0 / 468.0;
        min[8] = -12.0 / 468.0;

        assert_eq!(MinMaxScaler::new(scale, min).mismatch(&fitted), None);

        scale[7] = 1.0 / 700.0;
        assert_eq!(MinMaxScaler::new(scale, min).mismatch(&fitted), Some(7));
    }

    #[test]
    fn test_standard_scaler() {
        let mut mean = [0.0; FEATURE_COUNT];
        let mut scale = [1.0; FEATURE_COUNT];
        mean[5] = 5000.0;
        scale[5] = 2500.0;
        scale[6] = 0.0;

        let scaler = StandardScaler::new(mean, scale);
        let mut x = [0.0; FEATURE_COUNT];
        x[5] = 10000.0;
        x[6] = 7.0;

        let out = scaler.transform(&x);
        assert_eq!(out[5], 2.0);
        assert_eq!(out[6], 7.0);
        assert_eq!(scaler.kind(), "standard");
    }

    #[test]
    fn test_artifact_deserialization() {
        let json = r#"{
            "kind": "standard",
            "feature_names": ["a"],
            "mean": [1.0],
            "scale": [2.0]
        }"#;

        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();
        assert!(matches!(artifact, ScalerArtifact::Standard { .. }));
        assert_eq!(artifact.feature_names(), ["a".to_string()]);
    }
}
