//! Client feature record scored by the service

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 11;

/// Feature names in the exact order the scaler and classifier were fit on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Gender",
    "Married",
    "Dependents",
    "Education",
    "Self_Employed",
    "ApplicantIncome",
    "CoapplicantIncome",
    "LoanAmount",
    "Loan_Amount_Term",
    "Credit_History",
    "Property_Area",
];

/// Declared numeric type of a feature on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
}

/// Kind of each feature, indexed like `FEATURE_NAMES`.
pub const FEATURE_KINDS: [FieldKind; FEATURE_COUNT] = [
    FieldKind::Integer,
    FieldKind::Integer,
    FieldKind::Integer,
    FieldKind::Integer,
    FieldKind::Integer,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Float,
    FieldKind::Integer,
];

/// One loan applicant, as sent to `POST /predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientFeatures {
    /// 0 = female, 1 = male
    #[serde(rename = "Gender")]
    pub gender: i64,

    /// 0 = not married, 1 = married
    #[serde(rename = "Married")]
    pub married: i64,

    /// Number of dependents
    #[serde(rename = "Dependents")]
    pub dependents: i64,

    /// 0 = graduate, 1 = not graduate
    #[serde(rename = "Education")]
    pub education: i64,

    /// 0 = no, 1 = yes
    #[serde(rename = "Self_Employed")]
    pub self_employed: i64,

    #[serde(rename = "ApplicantIncome")]
    pub applicant_income: f64,

    #[serde(rename = "CoapplicantIncome")]
    pub coapplicant_income: f64,

    /// Loan amount in thousands
    #[serde(rename = "LoanAmount")]
    pub loan_amount: f64,

    /// Loan term in months
    #[serde(rename = "Loan_Amount_Term")]
    pub loan_amount_term: f64,

    /// 0.0 = bad, 1.0 = good
    #[serde(rename = "Credit_History")]
    pub credit_history: f64,

    /// 0 = rural, 1 = urban, 2 = semi-urban
    #[serde(rename = "Property_Area")]
    pub property_area: i64,
}

impl ClientFeatures {
    /// Parse a JSON request body, naming the field on any failure.
    ///
    /// Integer fields accept JSON integers and floats with no fractional
    /// part (`1.0`); float fields accept any JSON number. Strings, booleans
    /// and nulls are rejected, as are unknown keys.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
        Self::from_json_object(object)
    }

    /// Parse a JSON object, see [`ClientFeatures::from_json`].
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, ValidationError> {
        if let Some(unknown) = object
            .keys()
            .find(|key| !FEATURE_NAMES.contains(&key.as_str()))
        {
            return Err(ValidationError::UnknownField {
                field: unknown.clone(),
            });
        }

        let int = |field: &'static str| integer_field(object, field);
        let float = |field: &'static str| float_field(object, field);

        let features = Self {
            gender: int("Gender")?,
            married: int("Married")?,
            dependents: int("Dependents")?,
            education: int("Education")?,
            self_employed: int("Self_Employed")?,
            applicant_income: float("ApplicantIncome")?,
            coapplicant_income: float("CoapplicantIncome")?,
            loan_amount: float("LoanAmount")?,
            loan_amount_term: float("Loan_Amount_Term")?,
            credit_history: float("Credit_History")?,
            property_area: int("Property_Area")?,
        };

        features.validate()?;
        Ok(features)
    }

    /// Check every field against its domain.
    ///
    /// Out-of-domain categoricals (e.g. `Property_Area = 5`) are rejected
    /// rather than passed through the fitted transform.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_binary("Gender", self.gender)?;
        check_binary("Married", self.married)?;
        if self.dependents < 0 {
            return Err(out_of_domain("Dependents", self.dependents as f64, "an integer >= 0"));
        }
        check_binary("Education", self.education)?;
        check_binary("Self_Employed", self.self_employed)?;
        check_non_negative("ApplicantIncome", self.applicant_income)?;
        check_non_negative("CoapplicantIncome", self.coapplicant_income)?;
        check_non_negative("LoanAmount", self.loan_amount)?;
        check_finite("Loan_Amount_Term", self.loan_amount_term)?;
        if self.loan_amount_term <= 0.0 {
            return Err(out_of_domain("Loan_Amount_Term", self.loan_amount_term, "a number > 0"));
        }
        check_finite("Credit_History", self.credit_history)?;
        if self.credit_history != 0.0 && self.credit_history != 1.0 {
            return Err(out_of_domain("Credit_History", self.credit_history, "0.0 or 1.0"));
        }
        if !(0..=2).contains(&self.property_area) {
            return Err(out_of_domain(
                "Property_Area",
                self.property_area as f64,
                "one of {0, 1, 2}",
            ));
        }
        Ok(())
    }
}

fn lookup<'a>(object: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, ValidationError> {
    match object.get(field) {
        Some(Value::Null) | None => Err(ValidationError::Missing { field }),
        Some(value) => Ok(value),
    }
}

fn integer_field(object: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let value = lookup(object, field)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(ValidationError::InvalidType {
            field,
            expected: "an integer",
            found: describe(value),
        }),
    }
}

fn float_field(object: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationError> {
    let value = lookup(object, field)?;
    value.as_f64().ok_or_else(|| ValidationError::InvalidType {
        field,
        expected: "a number",
        found: describe(value),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

fn out_of_domain(field: &'static str, value: f64, domain: &'static str) -> ValidationError {
    ValidationError::OutOfDomain {
        field,
        value,
        domain,
    }
}

fn check_binary(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value == 0 || value == 1 {
        Ok(())
    } else {
        Err(out_of_domain(field, value as f64, "0 or 1"))
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(out_of_domain(field, value, "a finite number"))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    check_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(out_of_domain(field, value, "a number >= 0"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical_json() -> Value {
        json!({
            "Gender": 1,
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
        })
    }

    #[test]
    fn test_parse_canonical_applicant() {
        let features = ClientFeatures::from_json(&canonical_json()).unwrap();

        assert_eq!(features.gender, 1);
        assert_eq!(features.applicant_income, 5000.0);
        assert_eq!(features.loan_amount_term, 360.0);
        assert_eq!(features.credit_history, 1.0);
        assert_eq!(features.property_area, 1);
    }

    #[test]
    fn test_serde_field_names_match_schema() {
        let features = ClientFeatures::from_json(&canonical_json()).unwrap();
        let value = serde_json::to_value(features).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), FEATURE_COUNT);
        for name in FEATURE_NAMES {
            assert!(object.contains_key(name), "missing {name}");
        }

        let back: ClientFeatures = serde_json::from_value(value).unwrap();
        assert_eq!(back, features);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut body = canonical_json();
        body.as_object_mut().unwrap().remove("Credit_History");

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                field: "Credit_History"
            }
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let mut body = canonical_json();
        body["LoanAmount"] = Value::Null;

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert_eq!(err.field(), Some("LoanAmount"));
    }

    #[test]
    fn test_wrong_type_is_named() {
        let mut body = canonical_json();
        body["ApplicantIncome"] = json!("5000");

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidType {
                field: "ApplicantIncome",
                ..
            }
        ));
    }

    #[test]
    fn test_fractional_integer_rejected() {
        let mut body = canonical_json();
        body["Dependents"] = json!(1.5);

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert_eq!(err.field(), Some("Dependents"));
    }

    #[test]
    fn test_integral_float_accepted_for_integer_field() {
        let mut body = canonical_json();
        body["Dependents"] = json!(2.0);

        let features = ClientFeatures::from_json(&body).unwrap();
        assert_eq!(features.dependents, 2);
    }

    #[test]
    fn test_out_of_domain_categorical_rejected() {
        let mut body = canonical_json();
        body["Property_Area"] = json!(5);

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfDomain {
                field: "Property_Area",
                ..
            }
        ));
    }

    #[test]
    fn test_domain_checks() {
        let base = ClientFeatures::from_json(&canonical_json()).unwrap();

        let cases = [
            (ClientFeatures { gender: 2, ..base }, "Gender"),
            (ClientFeatures { dependents: -1, ..base }, "Dependents"),
            (ClientFeatures { applicant_income: -1.0, ..base }, "ApplicantIncome"),
            (ClientFeatures { loan_amount_term: 0.0, ..base }, "Loan_Amount_Term"),
            (ClientFeatures { credit_history: 0.5, ..base }, "Credit_History"),
            (ClientFeatures { loan_amount: f64::NAN, ..base }, "LoanAmount"),
        ];

        for (features, field) in cases {
            let err = features.validate().unwrap_err();
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut body = canonical_json();
        body["Loan_ID"] = json!("LP001002");

        let err = ClientFeatures::from_json(&body).unwrap_err();
        assert_eq!(err.field(), Some("Loan_ID"));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = ClientFeatures::from_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err, ValidationError::NotAnObject);
    }
}
