//! Client side of the scoring API: label translation, HTTP calls, verdicts

use crate::config::ClientConfig;
use crate::error::ValidationError;
use crate::types::decision::Approval;
use crate::types::features::{ClientFeatures, FEATURE_NAMES};
use crate::types::scoring::PredictionResponse;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failure to obtain a prediction from the service
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid client record: {0}")]
    Validation(#[from] ValidationError),

    #[error("scoring service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("scoring service answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Label/code pairs per categorical field. French labels come first and are
/// used for display.
const CODEBOOK: &[(&str, &[(&str, i64)])] = &[
    ("Gender", &[("Femme", 0), ("Homme", 1), ("Female", 0), ("Male", 1)]),
    (
        "Married",
        &[("Non Marié(e)", 0), ("Marié(e)", 1), ("No", 0), ("Yes", 1)],
    ),
    ("Dependents", &[("3+", 3)]),
    (
        "Education",
        &[
            ("Supérieur", 0),
            ("Non Supérieur", 1),
            ("Graduate", 0),
            ("Not Graduate", 1),
        ],
    ),
    ("Self_Employed", &[("Non", 0), ("Oui", 1), ("No", 0), ("Yes", 1)]),
    ("Credit_History", &[("Mauvais", 0), ("Bon", 1)]),
    (
        "Property_Area",
        &[
            ("Rurale", 0),
            ("Urbaine", 1),
            ("Semi-urbaine", 2),
            ("Rural", 0),
            ("Urban", 1),
            ("Semiurban", 2),
        ],
    ),
];

/// Translation between human-entered labels and numeric codes.
///
/// Matching ignores case and surrounding whitespace. A label with no code is
/// an error, never passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codebook;

impl Codebook {
    pub fn new() -> Self {
        Self
    }

    fn entries(field: &str) -> &'static [(&'static str, i64)] {
        CODEBOOK
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, entries)| *entries)
            .unwrap_or(&[])
    }

    /// Code for a label, if the field has one.
    pub fn code(&self, field: &str, label: &str) -> Option<i64> {
        let wanted = label.trim().to_lowercase();
        Self::entries(field)
            .iter()
            .find(|(text, _)| text.to_lowercase() == wanted)
            .map(|(_, code)| *code)
    }

    /// French display label for a code.
    pub fn label(&self, field: &str, code: i64) -> Option<&'static str> {
        Self::entries(field)
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(text, _)| *text)
    }

    /// Resolve one record value to a JSON number.
    ///
    /// Numbers pass through, numeric strings are parsed, other strings go
    /// through the codebook.
    pub fn resolve(&self, field: &'static str, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::Null => Err(ValidationError::Missing { field }),
            Value::Number(_) => Ok(value.clone()),
            Value::String(text) => {
                if let Ok(n) = text.trim().parse::<f64>() {
                    return Number::from_f64(n).map(Value::Number).ok_or(
                        ValidationError::OutOfDomain {
                            field,
                            value: n,
                            domain: "a finite number",
                        },
                    );
                }
                self.code(field, text)
                    .map(Value::from)
                    .ok_or_else(|| ValidationError::UnmappedLabel {
                        field,
                        label: text.clone(),
                    })
            }
            other => Err(ValidationError::InvalidType {
                field,
                expected: "a number or a label",
                found: other.to_string(),
            }),
        }
    }
}

/// A loosely typed client record, e.g. a row of a sample file.
///
/// Extra keys such as `Loan_ID` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ClientRecord(pub Map<String, Value>);

impl ClientRecord {
    /// Translate labels and validate into `ClientFeatures`.
    pub fn to_features(&self, codebook: &Codebook) -> Result<ClientFeatures, ValidationError> {
        let mut resolved = Map::new();
        for field in FEATURE_NAMES {
            let value = self.0.get(field).unwrap_or(&Value::Null);
            resolved.insert(field.to_string(), codebook.resolve(field, value)?);
        }
        ClientFeatures::from_json_object(&resolved)
    }

    /// Human-readable value of a field, with codes shown as labels.
    pub fn display_value(&self, codebook: &Codebook, field: &str) -> String {
        match self.0.get(field) {
            None | Some(Value::Null) => "N/A".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => value
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .and_then(|f| codebook.label(field, f as i64))
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// HTTP client for the scoring service
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /`, returning the service message.
    pub async fn health(&self) -> Result<String, ClientError> {
        #[derive(Deserialize)]
        struct Health {
            message: String,
        }

        let response = self.http.get(format!("{}/", self.base_url)).send().await?;
        let health: Health = Self::check(response).await?.json().await?;
        Ok(health.message)
    }

    /// `POST /predict` for one applicant.
    pub async fn predict(&self, features: &ClientFeatures) -> Result<PredictionResponse, ClientError> {
        features.validate()?;

        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .json(features)
            .send()
            .await?;
        let prediction: PredictionResponse = Self::check(response).await?.json().await?;

        debug!(
            status = %prediction.status,
            default_probability = prediction.default_probability,
            "Prediction received"
        );

        Ok(prediction)
    }

    /// Translate a raw record through the codebook, then score it.
    pub async fn predict_record(
        &self,
        record: &ClientRecord,
        codebook: &Codebook,
    ) -> Result<PredictionResponse, ClientError> {
        let features = record.to_features(codebook)?;
        self.predict(&features).await
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Warning for an approved profile that still looks fragile: bad credit
/// history, no co-applicant income, applicant income below 6000 and a loan
/// above 100 (thousands).
pub fn risk_warning(features: &ClientFeatures, approval: &Approval) -> Option<&'static str> {
    let fragile = features.credit_history == 0.0
        && features.coapplicant_income == 0.0
        && features.applicant_income < 6000.0
        && features.loan_amount > 100.0;

    if approval.approved && fragile {
        Some("Ce profil semble à risque, bien que la probabilité soit faible. Vérifiez les données ou revoyez le modèle.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::decision::DecisionPolicy;
    use serde_json::json;

    fn record(value: Value) -> ClientRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_codebook_lookup() {
        let codebook = Codebook::new();

        assert_eq!(codebook.code("Gender", "Homme"), Some(1));
        assert_eq!(codebook.code("Gender", "female"), Some(0));
        assert_eq!(codebook.code("Property_Area", "SEMIURBAN"), Some(2));
        assert_eq!(codebook.code("Property_Area", " Semi-urbaine "), Some(2));
        assert_eq!(codebook.code("Married", "marié(e)"), Some(1));
        assert_eq!(codebook.code("Dependents", "3+"), Some(3));
        assert_eq!(codebook.code("Property_Area", "Downtown"), None);
        assert_eq!(codebook.code("LoanAmount", "Yes"), None);
    }

    #[test]
    fn test_codebook_display_labels() {
        let codebook = Codebook::new();

        assert_eq!(codebook.label("Education", 1), Some("Non Supérieur"));
        assert_eq!(codebook.label("Property_Area", 2), Some("Semi-urbaine"));
        assert_eq!(codebook.label("Credit_History", 0), Some("Mauvais"));
        assert_eq!(codebook.label("Property_Area", 7), None);
    }

    #[test]
    fn test_record_with_labels() {
        let record = record(json!({
            "Loan_ID": "LP001015",
            "Gender": "Male",
            "Married": "Yes",
            "Dependents": "3+",
            "Education": "Graduate",
            "Self_Employed": "No",
            "ApplicantIncome": 5720,
            "CoapplicantIncome": 0,
            "LoanAmount": 110.0,
            "Loan_Amount_Term": 360.0,
            "Credit_History": 1.0,
            "Property_Area": "Urban"
        }));

        let features = record.to_features(&Codebook::new()).unwrap();

        assert_eq!(features.gender, 1);
        assert_eq!(features.married, 1);
        assert_eq!(features.dependents, 3);
        assert_eq!(features.education, 0);
        assert_eq!(features.property_area, 1);
        assert_eq!(features.applicant_income, 5720.0);
    }

    #[test]
    fn test_unmapped_label_rejected() {
        let record = record(json!({
            "Gender": "Unknown",
            "Married": 1,
            "Dependents": 0,
            "Education": 0,
            "Self_Employed": 0,
            "ApplicantIncome": 5000,
            "CoapplicantIncome": 0,
            "LoanAmount": 120,
            "Loan_Amount_Term": 360,
            "Credit_History": 1.0,
            "Property_Area": 1
        }));

        let err = record.to_features(&Codebook::new()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnmappedLabel {
                field: "Gender",
                label: "Unknown".to_string()
            }
        );
    }

    #[test]
    fn test_missing_value_rejected() {
        let record = record(json!({
            "Gender": 1,
            "Married": 1,
            "Dependents": 0,
            "Education": 0,
            "Self_Employed": 0,
            "ApplicantIncome": 5000,
            "CoapplicantIncome": 0,
            "LoanAmount": null,
            "Loan_Amount_Term": 360,
            "Credit_History": 1.0,
            "Property_Area": 1
        }));

        let err = record.to_features(&Codebook::new()).unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: "LoanAmount" });
    }

    #[test]
    fn test_non_finite_string_rejected() {
        let err = Codebook::new()
            .resolve("LoanAmount", &json!("NaN"))
            .unwrap_err();
        assert_eq!(err.field(), Some("LoanAmount"));
    }

    #[test]
    fn test_display_value() {
        let codebook = Codebook::new();
        let record = record(json!({ "Gender": 0, "Property_Area": 2, "LoanAmount": 120.5 }));

        assert_eq!(record.display_value(&codebook, "Gender"), "Femme");
        assert_eq!(record.display_value(&codebook, "Property_Area"), "Semi-urbaine");
        assert_eq!(record.display_value(&codebook, "LoanAmount"), "120.5");
        assert_eq!(record.display_value(&codebook, "Married"), "N/A");
    }

    #[test]
    fn test_risk_warning() {
        let fragile = ClientFeatures {
            gender: 1,
            married: 0,
            dependents: 0,
            education: 0,
            self_employed: 0,
            applicant_income: 3000.0,
            coapplicant_income: 0.0,
            loan_amount: 150.0,
            loan_amount_term: 360.0,
            credit_history: 0.0,
            property_area: 1,
        };
        let policy = DecisionPolicy::default();

        assert!(risk_warning(&fragile, &policy.evaluate(0.05)).is_some());
        assert!(risk_warning(&fragile, &policy.evaluate(0.9)).is_none());

        let solid = ClientFeatures {
            credit_history: 1.0,
            ..fragile
        };
        assert!(risk_warning(&solid, &policy.evaluate(0.05)).is_none());
    }

    #[test]
    fn test_client_base_url_normalized() {
        let client = ScoringClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
