//! Credit Scoring Service - Main Entry Point
//!
//! Loads the scoring artifacts, then serves `GET /`, `POST /predict` and
//! `GET /metrics` until interrupted.

use anyhow::Result;
use credit_scoring_service::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ScoringMetrics},
    models::inference::ScoringService,
    server::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    info!("Starting Credit Scoring Service");

    // Artifacts must load before anything is served
    let service = Arc::new(ScoringService::from_config(&config)?);
    let policy = service.policy();
    info!(
        model = %service.model_name(),
        "Scoring service ready. Decision strategy: {:?}, approval threshold: {:.2}",
        policy.strategy,
        policy.approval_threshold
    );

    let metrics = Arc::new(ScoringMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(service, metrics.clone());
    server::serve(&config.server, state).await?;

    info!("Scoring service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("credit_scoring_service={}", logging.level).parse()?)
        .add_directive(format!("scoring_service={}", logging.level).parse()?)
        .add_directive("tower_http=info".parse()?);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
