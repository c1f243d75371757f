//! Feature extraction for credit scoring model inference.
//!
//! This is the only place where the named `ClientFeatures` record becomes a
//! positional vector.

use crate::types::features::{ClientFeatures, FEATURE_COUNT};

/// Positional model input, ordered like `FEATURE_NAMES`.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Feature extractor that transforms client records into model input features.
///
/// Features are extracted in the exact order the scaler and classifier were fit on.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the feature vector for one applicant.
    pub fn extract(&self, client: &ClientFeatures) -> FeatureVector {
        [
            client.gender as f64,
            client.married as f64,
            client.dependents as f64,
            client.education as f64,
            client.self_employed as f64,
            client.applicant_income,
            client.coapplicant_income,
            client.loan_amount,
            client.loan_amount_term,
            client.credit_history,
            client.property_area as f64,
        ]
    }
}
