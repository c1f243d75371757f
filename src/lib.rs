//! Credit Scoring Service Library
//!
//! Loads a fitted scaler and classifier once at startup and scores loan
//! applicants over HTTP.

pub mod client;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use client::{Codebook, ScoringClient};
pub use config::AppConfig;
pub use error::ValidationError;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::ScoringService;
pub use server::AppState;
pub use types::{ClientFeatures, CreditStatus, DecisionPolicy, PredictionResponse, ScoringResult};
