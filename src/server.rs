//! HTTP boundary of the scoring service

use crate::config::ServerConfig;
use crate::error::ValidationError;
use crate::metrics::{MetricsSnapshot, ScoringMetrics};
use crate::models::inference::ScoringService;
use crate::types::features::ClientFeatures;
use crate::types::scoring::PredictionResponse;
use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared, read-only handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScoringService>,
    pub metrics: Arc<ScoringMetrics>,
}

impl AppState {
    pub fn new(service: Arc<ScoringService>, metrics: Arc<ScoringMetrics>) -> Self {
        Self { service, metrics }
    }
}

/// Errors surfaced to API callers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{}", .0.body_text())]
    BadRequest(#[from] JsonRejection),

    #[error("internal scoring error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    field: Option<String>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            ApiError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.field().map(str::to_string)),
            ApiError::BadRequest(rejection) => (rejection.status(), None),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorBody {
            detail: ErrorDetail {
                field,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the router with its middleware stack.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_millis(config.request_timeout_ms)))
        .layer(TraceLayer::new_for_http());

    if config.cors_allow_any {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!(address = %addr, "Scoring service listening");

    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "message": state.service.health() }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4();

    let parsed = payload
        .map_err(ApiError::from)
        .and_then(|Json(body)| ClientFeatures::from_json(&body).map_err(ApiError::from));
    let features = match parsed {
        Ok(features) => features,
        Err(e) => {
            state.metrics.record_validation_failure();
            warn!(request_id = %request_id, error = %e, "Rejected scoring request");
            return Err(e);
        }
    };

    match state.service.predict(&features) {
        Ok(result) => {
            let processing_time = start_time.elapsed();
            state.metrics.record_prediction(processing_time, &result);

            info!(
                request_id = %request_id,
                label = result.label,
                raw_probability = result.raw_probability,
                default_probability = result.default_probability,
                status = %result.status,
                processing_time_us = processing_time.as_micros(),
                "Applicant scored"
            );

            Ok(Json(PredictionResponse::from(&result)))
        }
        Err(e) => {
            state.metrics.record_internal_error();
            error!(request_id = %request_id, error = %e, "Inference failed");
            Err(ApiError::Internal(e))
        }
    }
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_validation_error_response() {
        let err = ApiError::from(ValidationError::Missing {
            field: "Credit_History",
        });
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"]["field"], "Credit_History");
        assert_eq!(json["detail"]["message"], "missing field `Credit_History`");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err = ApiError::Internal(anyhow::anyhow!("tensor shape mismatch"));
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"]["message"], "internal scoring error");
        assert!(json["detail"]["field"].is_null());
    }
}
