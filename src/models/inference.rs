//! Scoring service: the one inference operation of the API

use crate::config::AppConfig;
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::{ArtifactLoader, ScoringArtifacts};
use crate::types::decision::DecisionPolicy;
use crate::types::features::ClientFeatures;
use crate::types::scoring::{round_probability, ScoringResult};
use anyhow::Result;
use tracing::{debug, info};

/// Liveness message returned by `GET /`.
pub const HEALTH_MESSAGE: &str = "API de scoring de crédit opérationnelle 🎯";

/// Owns the fitted artifacts for the process lifetime and scores applicants.
pub struct ScoringService {
    artifacts: ScoringArtifacts,
    extractor: FeatureExtractor,
    policy: DecisionPolicy,
}

impl ScoringService {
    /// Create a service from already loaded artifacts.
    pub fn new(artifacts: ScoringArtifacts, policy: DecisionPolicy) -> Self {
        Self {
            artifacts,
            extractor: FeatureExtractor::new(),
            policy,
        }
    }

    /// Load the artifacts named in the configuration.
    ///
    /// Fails if either artifact is missing or corrupt.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let loader = ArtifactLoader::with_threads(config.artifacts.onnx_threads);
        let artifacts = loader.load(&config.artifacts)?;

        info!(
            strategy = ?config.decision.strategy,
            approval_threshold = config.decision.approval_threshold,
            "Scoring service initialized"
        );

        Ok(Self::new(artifacts, config.decision))
    }

    /// Decision policy in effect.
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Name of the loaded classifier.
    pub fn model_name(&self) -> &str {
        self.artifacts.classifier.name()
    }

    /// Static liveness acknowledgement.
    pub fn health(&self) -> &'static str {
        HEALTH_MESSAGE
    }

    /// Score one applicant.
    pub fn predict(&self, features: &ClientFeatures) -> Result<ScoringResult> {
        let raw = self.extractor.extract(features);
        let scaled = self.artifacts.scaler.transform(&raw);
        let (label, raw_probability) = self.artifacts.classifier.classify(&scaled)?;

        if !(0.0..=1.0).contains(&raw_probability) {
            anyhow::bail!(
                "Classifier {} returned probability {} outside [0, 1]",
                self.model_name(),
                raw_probability
            );
        }

        let default_probability = round_probability(raw_probability);
        let status = self.policy.status_for(label, default_probability);

        debug!(
            label = label,
            raw_probability = raw_probability,
            default_probability = default_probability,
            status = %status,
            "Applicant scored"
        );

        Ok(ScoringResult {
            status,
            default_probability,
            raw_probability,
            label,
        })
    }
}
