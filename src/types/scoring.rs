//! Scoring results and the `/predict` response shape

use serde::{Deserialize, Serialize};

/// Credit decision returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    #[serde(rename = "Accepté")]
    Accepted,
    #[serde(rename = "Refusé")]
    Rejected,
}

impl CreditStatus {
    /// Map a classifier label to a status. Label 1 is the default class.
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            CreditStatus::Rejected
        } else {
            CreditStatus::Accepted
        }
    }

    /// Wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Accepted => "Accepté",
            CreditStatus::Rejected => "Refusé",
        }
    }
}

impl std::fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring one applicant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringResult {
    /// Decision under the configured policy
    pub status: CreditStatus,
    /// Probability of default, rounded to 2 decimals
    pub default_probability: f64,
    /// Unrounded probability of default
    pub raw_probability: f64,
    /// Label predicted by the classifier (1 = default)
    pub label: u8,
}

/// JSON body of a successful `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(rename = "Statut Crédit")]
    pub status: CreditStatus,
    #[serde(rename = "Probabilité de défaut")]
    pub default_probability: f64,
}

impl From<&ScoringResult> for PredictionResponse {
    fn from(result: &ScoringResult) -> Self {
        Self {
            status: result.status,
            default_probability: result.default_probability,
        }
    }
}

/// Round a probability to 2 decimals for transport.
///
/// Rounds the exact binary value half to even, so `0.125` becomes `0.12`
/// and `0.07265` becomes `0.07`.
pub fn round_probability(probability: f64) -> f64 {
    format!("{probability:.2}").parse().unwrap_or(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_label() {
        assert_eq!(CreditStatus::from_label(1), CreditStatus::Rejected);
        assert_eq!(CreditStatus::from_label(0), CreditStatus::Accepted);
    }

    #[test]
    fn test_round_probability() {
        assert_eq!(round_probability(0.07265), 0.07);
        assert_eq!(round_probability(0.10208483392194585), 0.1);
        assert_eq!(round_probability(0.9335188077415235), 0.93);
        assert_eq!(round_probability(0.125), 0.12);
        assert_eq!(round_probability(0.0), 0.0);
        assert_eq!(round_probability(1.0), 1.0);
        assert_eq!(round_probability(0.999), 1.0);
    }

    #[test]
    fn test_response_serialization() {
        let result = ScoringResult {
            status: CreditStatus::Rejected,
            default_probability: 0.93,
            raw_probability: 0.9335,
            label: 1,
        };

        let json = serde_json::to_value(PredictionResponse::from(&result)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "Statut Crédit": "Refusé",
                "Probabilité de défaut": 0.93
            })
        );
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"Statut Crédit": "Accepté", "Probabilité de défaut": 0.1}"#;
        let response: PredictionResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.status, CreditStatus::Accepted);
        assert_eq!(response.default_probability, 0.1);
    }
}
