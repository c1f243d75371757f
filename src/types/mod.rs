//! Type definitions for the credit scoring service

pub mod decision;
pub mod features;
pub mod scoring;

pub use decision::{Approval, DecisionPolicy, DecisionStrategy};
pub use features::{ClientFeatures, FEATURE_COUNT, FEATURE_NAMES};
pub use scoring::{CreditStatus, PredictionResponse, ScoringResult};
