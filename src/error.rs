//! Validation errors raised before a request reaches the model

use thiserror::Error;

/// A request body or client record that cannot be turned into `ClientFeatures`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("missing field `{field}`")]
    Missing { field: &'static str },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    #[error("field `{field}` must be {expected}, got {found}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("field `{field}` is {value}, expected {domain}")]
    OutOfDomain {
        field: &'static str,
        value: f64,
        domain: &'static str,
    },

    #[error("field `{field}` has no code for label {label:?}")]
    UnmappedLabel { field: &'static str, label: String },

    #[error("{0}")]
    Malformed(String),
}

impl ValidationError {
    /// Name of the offending field, when the error is about a single field.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Missing { field }
            | Self::InvalidType { field, .. }
            | Self::OutOfDomain { field, .. }
            | Self::UnmappedLabel { field, .. } => Some(*field),
            Self::UnknownField { field } => Some(field.as_str()),
            Self::NotAnObject | Self::Malformed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_identification() {
        let err = ValidationError::Missing {
            field: "Credit_History",
        };
        assert_eq!(err.field(), Some("Credit_History"));
        assert_eq!(err.to_string(), "missing field `Credit_History`");

        let err = ValidationError::OutOfDomain {
            field: "Property_Area",
            value: 5.0,
            domain: "one of {0, 1, 2}",
        };
        assert_eq!(err.field(), Some("Property_Area"));
        assert!(err.to_string().contains("Property_Area"));

        assert_eq!(ValidationError::NotAnObject.field(), None);
    }
}
