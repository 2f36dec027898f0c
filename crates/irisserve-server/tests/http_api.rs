//! HTTP API tests driving the router in-process

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use irisserve_model::{ArtifactError, ModelArtifact, ModelSnapshot, Row, SnapshotStore};
use irisserve_server::{create_router, AppState, ServerConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

fn loaded_app() -> Router {
    let config = ServerConfig {
        model_path: models_dir().join("iris_model.json"),
        metadata_path: models_dir().join("model_metadata.json"),
        ..Default::default()
    };
    create_router(AppState::new(config, None))
}

fn unloaded_app() -> Router {
    let config = ServerConfig {
        model_path: models_dir().join("missing_model.json"),
        metadata_path: models_dir().join("missing_metadata.json"),
        ..Default::default()
    };
    create_router(AppState::new(config, None))
}

/// Artifact that counts invocations and always answers class 0
struct CountingArtifact {
    calls: AtomicU32,
}

impl ModelArtifact for CountingArtifact {
    fn predict(&self, batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(vec![0; batch.len()])
    }

    fn predict_probability(&self, batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(vec![vec![1.0]; batch.len()])
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Artifact whose evaluation always fails
struct BrokenArtifact;

impl ModelArtifact for BrokenArtifact {
    fn predict(&self, _batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        Err(ArtifactError::internal("corrupt tree"))
    }

    fn predict_probability(&self, _batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        Err(ArtifactError::internal("corrupt tree"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Log sink shared between a test and its subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture WARN and above on the current thread until the guard drops
fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

fn app_with(artifact: Arc<dyn ModelArtifact>, config: ServerConfig) -> Router {
    let store = SnapshotStore::with_snapshot(ModelSnapshot::new(artifact, None));
    create_router(AppState::with_store(config, Arc::new(store), None))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn setosa() -> Value {
    json!({
        "sepal_length": 5.1,
        "sepal_width": 3.5,
        "petal_length": 1.4,
        "petal_width": 0.2
    })
}

#[tokio::test]
async fn test_root_endpoint() {
    let (status, body) = get(loaded_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Iris ML Service");
    assert_eq!(body["docs"], "/docs");
    assert_eq!(body["version"], "1.0.0");
}

#[tokio::test]
async fn test_health_when_loaded() {
    let (status, body) = get(loaded_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_info"]["model_type"], "RandomForestClassifier");
    assert_eq!(
        body["model_info"]["target_names"],
        json!(["setosa", "versicolor", "virginica"])
    );
}

#[tokio::test]
async fn test_health_when_unloaded() {
    let (status, body) = get(unloaded_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["model_info"], Value::Null);
}

#[tokio::test]
async fn test_predict_setosa() {
    let (status, body) = post_json(loaded_app(), "/predict", setosa()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "setosa");
    assert_eq!(body["probability"], 1.0);
    assert_eq!(body["features"], setosa());
}

#[tokio::test]
async fn test_predict_without_model() {
    let (status, body) = post_json(unloaded_app(), "/predict", setosa()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Model not loaded");
}

#[tokio::test]
async fn test_predict_negative_feature() {
    let mut input = setosa();
    input["petal_width"] = json!(-0.5);

    let (status, body) = post_json(loaded_app(), "/predict", input).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("petal_width"));
}

#[tokio::test]
async fn test_predict_missing_field() {
    let (status, body) = post_json(loaded_app(), "/predict", json!({ "sepal_length": 5.1 })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("sepal_width"));
}

#[tokio::test]
async fn test_predict_malformed_body() {
    let request = Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _) = send(loaded_app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unavailable_model_is_logged() {
    let app = unloaded_app();
    let (logs, _guard) = capture_warnings();

    let (status, _) = post_json(app.clone(), "/predict", setosa()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = post_json(app.clone(), "/predict_batch", json!([setosa()])).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (status, _) = get(app, "/model_info").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let output = logs.contents();
    assert!(output.contains("Prediction unavailable: model not loaded"));
    assert!(output.contains("Batch prediction unavailable: model not loaded"));
    assert!(output.contains("Model metadata not available"));
}

#[tokio::test]
async fn test_missing_content_type() {
    let request = Request::post("/predict")
        .body(Body::from(setosa().to_string()))
        .unwrap();

    let (status, body) = send(loaded_app(), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_oversized_body() {
    let config = ServerConfig {
        body_limit_bytes: 16,
        ..Default::default()
    };
    let app = app_with(
        Arc::new(CountingArtifact {
            calls: AtomicU32::new(0),
        }),
        config,
    );
    let request = Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from(setosa().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_predict_inference_failure() {
    let app = app_with(Arc::new(BrokenArtifact), ServerConfig::default());

    let (status, body) = post_json(app, "/predict", setosa()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Prediction failed");
}

#[tokio::test]
async fn test_batch_preserves_order() {
    let batch = json!([
        { "sepal_length": 6.9, "sepal_width": 3.1, "petal_length": 5.4, "petal_width": 2.1 },
        setosa(),
        { "sepal_length": 6.0, "sepal_width": 2.9, "petal_length": 4.5, "petal_width": 1.5 },
    ]);

    let (status, body) = post_json(loaded_app(), "/predict_batch", batch.clone()).await;

    assert_eq!(status, StatusCode::OK);
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 3);

    let expected = ["virginica", "setosa", "versicolor"];
    for (position, item) in predictions.iter().enumerate() {
        assert_eq!(item["sample_id"], position);
        assert_eq!(item["prediction"], expected[position]);
        assert_eq!(item["features"], batch[position]);
        let probability = item["probability"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&probability));
    }
}

#[tokio::test]
async fn test_batch_with_invalid_item_fails_whole_request() {
    let artifact = Arc::new(CountingArtifact {
        calls: AtomicU32::new(0),
    });
    let app = app_with(artifact.clone(), ServerConfig::default());

    let mut bad = setosa();
    bad["sepal_length"] = json!(-1);
    let (status, body) = post_json(app, "/predict_batch", json!([setosa(), bad])).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.get("predictions").is_none());
    assert!(body["detail"].as_str().unwrap().starts_with("sample 1"));
    assert_eq!(artifact.calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_batch_over_limit() {
    let config = ServerConfig {
        max_batch_size: 2,
        ..Default::default()
    };
    let app = app_with(
        Arc::new(CountingArtifact {
            calls: AtomicU32::new(0),
        }),
        config,
    );

    let (status, _) = post_json(app, "/predict_batch", json!([setosa(), setosa(), setosa()])).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_empty_batch() {
    let (status, body) = post_json(loaded_app(), "/predict_batch", json!([])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "predictions": [] }));
}

#[tokio::test]
async fn test_batch_without_model() {
    let (status, body) = post_json(unloaded_app(), "/predict_batch", json!([setosa()])).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Model not loaded");
}

#[tokio::test]
async fn test_model_info() {
    let (status, body) = get(loaded_app(), "/model_info").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "RandomForestClassifier");
    assert_eq!(body["feature_names"].as_array().unwrap().len(), 4);
    assert_eq!(body["model_parameters"]["n_estimators"], 3);
    assert_eq!(body["model_parameters"]["max_depth"], 3);
}

#[tokio::test]
async fn test_model_info_without_metadata() {
    let app = app_with(
        Arc::new(CountingArtifact {
            calls: AtomicU32::new(0),
        }),
        ServerConfig::default(),
    );

    let (status, body) = get(app, "/model_info").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], "Model metadata not available");
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _) = get(loaded_app(), "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
