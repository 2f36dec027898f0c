//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use irisserve_core::{
    validate, validate_batch, BatchPredictionResult, Error, InferenceError, InfoError,
    PredictionResult, RawFeatures, ValidationError,
};
use irisserve_model::{health, model_info, MetadataSummary, ModelInfo};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::config::CorsConfig;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let body_limit = RequestBodyLimitLayer::new(state.config.body_limit_bytes);

    Router::new()
        .route("/", get(root))
        .route("/docs", get(docs))
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .route("/predict_batch", post(predict_batch))
        .route("/model_info", get(get_model_info))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allow_any_origin {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn root() -> impl IntoResponse {
    metrics::counter!("irisserve_requests_total", "endpoint" => "root").increment(1);

    Json(json!({
        "message": "Iris ML Service",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
    }))
}

async fn docs() -> impl IntoResponse {
    Json(json!({
        "endpoints": [
            { "method": "GET", "path": "/", "description": "Service banner" },
            { "method": "GET", "path": "/health", "description": "Readiness and model summary" },
            { "method": "POST", "path": "/predict", "description": "Classify one sample" },
            { "method": "POST", "path": "/predict_batch", "description": "Classify an ordered list of samples" },
            { "method": "GET", "path": "/model_info", "description": "Model type, labels, and training parameters" },
            { "method": "GET", "path": "/metrics", "description": "Prometheus metrics" },
        ],
        "features": ["sepal_length", "sepal_width", "petal_length", "petal_width"],
    }))
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_info: Option<MetadataSummary>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    metrics::counter!("irisserve_requests_total", "endpoint" => "health").increment(1);

    let report = health(state.engine.store());
    Json(HealthResponse {
        status: if report.ready { "healthy" } else { "unhealthy" },
        model_loaded: report.ready,
        model_info: report.metadata_summary,
    })
}

/// Single prediction handler
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<RawFeatures>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    metrics::counter!("irisserve_requests_total", "endpoint" => "predict").increment(1);

    let Json(raw) = payload.map_err(AppError::Rejected)?;
    let result = predict_one(&state, &raw).map_err(|e| AppError::failed("Prediction", e))?;

    Ok(Json(result))
}

fn predict_one(state: &AppState, raw: &RawFeatures) -> irisserve_core::Result<PredictionResult> {
    let features = validate(raw)?;
    debug!(?features, "Validated prediction request");

    let start = Instant::now();
    let result = state.engine.predict_one(&features)?;
    record_inference("single", start, 1);

    Ok(result)
}

/// Batch prediction handler
async fn predict_batch(
    State(state): State<AppState>,
    payload: Result<Json<Vec<RawFeatures>>, JsonRejection>,
) -> Result<Json<BatchPredictionResult>, AppError> {
    metrics::counter!("irisserve_requests_total", "endpoint" => "predict_batch").increment(1);

    let Json(raws) = payload.map_err(AppError::Rejected)?;
    let result =
        predict_many(&state, &raws).map_err(|e| AppError::failed("Batch prediction", e))?;

    Ok(Json(result))
}

fn predict_many(
    state: &AppState,
    raws: &[RawFeatures],
) -> irisserve_core::Result<BatchPredictionResult> {
    let features = validate_batch(raws, state.config.max_batch_size)?;
    debug!(samples = features.len(), "Validated batch request");

    let start = Instant::now();
    let result = state.engine.predict_batch(&features)?;
    record_inference("batch", start, result.len() as u64);

    Ok(result)
}

async fn get_model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>, AppError> {
    metrics::counter!("irisserve_requests_total", "endpoint" => "model_info").increment(1);

    let info = model_info(state.engine.store()).map_err(|e| AppError::failed("Model info", e))?;
    Ok(Json(info))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}

fn record_inference(kind: &'static str, start: Instant, samples: u64) {
    metrics::histogram!("irisserve_inference_latency_us", "kind" => kind)
        .record(start.elapsed().as_micros() as f64);
    metrics::counter!("irisserve_predictions_total", "kind" => kind).increment(samples);
}

/// Error handling
#[derive(Debug)]
enum AppError {
    /// The body could not be extracted as JSON
    Rejected(JsonRejection),

    /// An operation failed after extraction
    Failed {
        operation: &'static str,
        source: Error,
    },
}

impl AppError {
    fn failed(operation: &'static str, source: impl Into<Error>) -> Self {
        AppError::Failed {
            operation,
            source: source.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match self {
            // Bodies that are not valid feature JSON are validation failures;
            // transport problems (size, content type) keep their own status.
            AppError::Rejected(
                rejection @ (JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_)),
            ) => {
                let err = ValidationError::Malformed(rejection.body_text());
                warn!("Rejected request: {}", err);
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", err.to_string())
            }
            AppError::Rejected(rejection) => {
                warn!(status = %rejection.status(), "Rejected request body: {}", rejection.body_text());
                (rejection.status(), "rejected", rejection.body_text())
            }
            AppError::Failed {
                operation,
                source: Error::Validation(err),
            } => {
                warn!(operation, field = err.field(), "Rejected request: {}", err);
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", err.to_string())
            }
            AppError::Failed {
                operation,
                source: Error::Inference(InferenceError::ModelUnavailable),
            } => {
                warn!(operation, "{} unavailable: model not loaded", operation);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "model_unavailable",
                    "Model not loaded".to_string(),
                )
            }
            AppError::Failed {
                operation,
                source: Error::Info(InfoError::MetadataUnavailable),
            } => {
                warn!(operation, "Model metadata not available");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "metadata_unavailable",
                    "Model metadata not available".to_string(),
                )
            }
            AppError::Failed { operation, source } => {
                error!(operation, "{} failed: {}", operation, source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    format!("{} failed", operation),
                )
            }
        };

        metrics::counter!("irisserve_errors_total", "type" => kind).increment(1);

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
