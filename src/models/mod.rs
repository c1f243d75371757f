//! ML model inference components

pub mod classifier;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::{Classifier, LogisticRegression};
pub use inference::ScoringService;
pub use loader::{ArtifactLoader, ScoringArtifacts};
pub use scaler::{MinMaxScaler, Scaler, StandardScaler};
