//! IrisServe
//!
//! Serves iris species predictions from a pre-trained random forest.
//! The model is loaded once at startup; if that fails the server still
//! starts and reports itself unhealthy until restarted.

use anyhow::Result;
use clap::Parser;
use irisserve_server::{create_router, AppState, Cli, ServerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose, cli.log_json);

    info!("Starting Iris ML Service...");

    // Load configuration
    let config = ServerConfig::load(&cli)?;
    info!("Configuration loaded successfully");
    info!("Model: {}", config.model_path.display());
    info!("Metadata: {}", config.metadata_path.display());
    info!("Max batch size: {}", config.max_batch_size);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load the model before accepting traffic
    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(config, Some(metrics_handle));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new(
            "irisserve=debug,irisserve_server=debug,irisserve_model=debug,irisserve_core=debug,tower_http=debug",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("irisserve=info,irisserve_server=info,irisserve_model=info,irisserve_core=info")
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "irisserve_requests_total",
        "Total number of requests by endpoint"
    );
    metrics::describe_counter!(
        "irisserve_predictions_total",
        "Total number of samples predicted by request kind"
    );
    metrics::describe_histogram!(
        "irisserve_inference_latency_us",
        metrics::Unit::Microseconds,
        "Inference latency in microseconds by request kind"
    );
    metrics::describe_counter!("irisserve_errors_total", "Total number of errors by type");

    info!("Metrics exporter initialized");
    Ok(handle)
}
