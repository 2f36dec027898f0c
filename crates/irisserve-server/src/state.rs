//! Shared application state

use irisserve_model::{InferenceEngine, SnapshotStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Inference engine and the snapshot store it reads from
    pub engine: InferenceEngine,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Initialize application state, loading the model once.
    ///
    /// A failed load is logged and leaves the service unready; it does not
    /// prevent the server from starting.
    pub fn new(config: ServerConfig, metrics_handle: Option<PrometheusHandle>) -> Self {
        info!("Loading model from: {}", config.model_path.display());

        let store = SnapshotStore::new();
        match store.load(&config.model_path, &config.metadata_path) {
            Ok(_) => info!("Model ready"),
            Err(e) => error!("Model unavailable, serving unready until restart: {}", e),
        }

        Self::with_store(config, Arc::new(store), metrics_handle)
    }

    /// Build state around an existing store
    pub fn with_store(
        config: ServerConfig,
        store: Arc<SnapshotStore>,
        metrics_handle: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine: InferenceEngine::new(store),
            metrics_handle,
        }
    }
}
