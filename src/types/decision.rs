//! Credit decision policy shared by the service and its callers

use crate::types::scoring::{round_probability, CreditStatus};
use serde::{Deserialize, Serialize};

/// How the service turns a prediction into a `CreditStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStrategy {
    /// Use the classifier's label: 1 (default) rejects, 0 accepts
    #[default]
    Label,
    /// Accept when the rounded probability is at or below `approval_threshold`
    Threshold,
}

/// The single decision boundary of the system.
///
/// The service applies `strategy` to build `Statut Crédit`; callers apply
/// `approval_threshold` to the returned probability via [`DecisionPolicy::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    #[serde(default)]
    pub strategy: DecisionStrategy,
    /// Probability of default at or below which credit is approved
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: f64,
}

fn default_approval_threshold() -> f64 {
    0.10
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            strategy: DecisionStrategy::Label,
            approval_threshold: default_approval_threshold(),
        }
    }
}

impl DecisionPolicy {
    /// Status reported by the service for a label and a rounded probability.
    pub fn status_for(&self, label: u8, default_probability: f64) -> CreditStatus {
        match self.strategy {
            DecisionStrategy::Label => CreditStatus::from_label(label),
            DecisionStrategy::Threshold => {
                if default_probability <= self.approval_threshold {
                    CreditStatus::Accepted
                } else {
                    CreditStatus::Rejected
                }
            }
        }
    }

    /// Caller-side verdict for a probability returned by `/predict`.
    pub fn evaluate(&self, default_probability: f64) -> Approval {
        Approval {
            approved: round_probability(default_probability) <= self.approval_threshold,
            risk_percent: default_probability * 100.0,
            threshold_percent: self.approval_threshold * 100.0,
        }
    }
}

/// Verdict shown to a human operator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Approval {
    pub approved: bool,
    pub risk_percent: f64,
    pub threshold_percent: f64,
}

impl std::fmt::Display for Approval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verdict = if self.approved {
            "Crédit Approuvé"
        } else {
            "Crédit Refusé"
        };
        write!(
            f,
            "{} (risque {:.2}%) – Seuil : {}%",
            verdict, self.risk_percent, self.threshold_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_strategy_ignores_threshold() {
        let policy = DecisionPolicy::default();

        assert_eq!(policy.status_for(1, 0.02), CreditStatus::Rejected);
        assert_eq!(policy.status_for(0, 0.45), CreditStatus::Accepted);
    }

    #[test]
    fn test_threshold_strategy() {
        let policy = DecisionPolicy {
            strategy: DecisionStrategy::Threshold,
            approval_threshold: 0.10,
        };

        assert_eq!(policy.status_for(0, 0.10), CreditStatus::Accepted);
        assert_eq!(policy.status_for(0, 0.11), CreditStatus::Rejected);
        assert_eq!(policy.status_for(1, 0.05), CreditStatus::Accepted);
    }

    #[test]
    fn test_evaluate_at_boundary() {
        let policy = DecisionPolicy::default();

        let approval = policy.evaluate(0.1);
        assert!(approval.approved);
        assert_eq!(approval.threshold_percent, 10.0);

        assert!(!policy.evaluate(0.12).approved);
    }

    #[test]
    fn test_approval_display() {
        let approval = DecisionPolicy::default().evaluate(0.93);
        let text = approval.to_string();

        assert!(text.starts_with("Crédit Refusé"));
        assert!(text.contains("93.00%"));
    }

    #[test]
    fn test_policy_deserialization_defaults() {
        let policy: DecisionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, DecisionPolicy::default());

        let policy: DecisionPolicy =
            serde_json::from_str(r#"{"strategy": "threshold", "approval_threshold": 0.2}"#)
                .unwrap();
        assert_eq!(policy.strategy, DecisionStrategy::Threshold);
        assert_eq!(policy.approval_threshold, 0.2);
    }
}
