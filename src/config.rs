//! Configuration management for the credit scoring service

use crate::types::decision::DecisionPolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Default configuration file, overridable with `SCORING_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Serialized format of the classifier artifact
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierFormat {
    /// JSON logistic regression artifact
    #[default]
    Json,
    /// ONNX model, needs the `onnx` feature
    Onnx,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub decision: DecisionPolicy,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Allow cross-origin calls from any dashboard host
    #[serde(default = "default_cors_allow_any")]
    pub cors_allow_any: bool,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_cors_allow_any() -> bool {
    true
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context(format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Scaler and classifier artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Fitted scaler (JSON)
    pub scaler_path: String,
    /// Fitted classifier
    pub classifier_path: String,
    /// Format of the classifier file
    #[serde(default)]
    pub classifier_format: ClassifierFormat,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries, 0 disables them
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

fn default_report_interval_secs() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

/// Settings for callers of the API
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the scoring service
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_client_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_client_timeout_ms() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_client_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `SCORING_CONFIG` or the default file
    pub fn load() -> Result<Self> {
        let path =
            std::env::var("SCORING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, then `SCORING__*` environment overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SCORING").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                request_timeout_ms: default_request_timeout_ms(),
                cors_allow_any: default_cors_allow_any(),
            },
            artifacts: ArtifactsConfig {
                scaler_path: "artifacts/scaler_minmax.json".to_string(),
                classifier_path: "artifacts/logistic_regression.json".to_string(),
                classifier_format: ClassifierFormat::Json,
                onnx_threads: default_onnx_threads(),
            },
            decision: DecisionPolicy::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig::default(),
            client: ClientConfig::default(),
        }
    }
}
