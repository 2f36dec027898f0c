//! Server configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Model artifact path
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Model metadata path; a missing file is tolerated
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,

    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of samples per batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Maximum request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(&cli.config).exists() {
            let content = std::fs::read_to_string(&cli.config)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(model) = &cli.model {
            config.model_path = model.clone();
        }

        if let Some(metadata) = &cli.metadata {
            config.metadata_path = metadata.clone();
        }

        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(max_batch_size) = cli.max_batch_size {
            config.max_batch_size = max_batch_size;
        }

        if config.max_batch_size == 0 {
            anyhow::bail!("max_batch_size must be at least 1");
        }

        Ok(config)
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            metadata_path: default_metadata_path(),
            listen: default_listen(),
            port: default_port(),
            max_batch_size: default_max_batch_size(),
            body_limit_bytes: default_body_limit(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allow requests from any origin
    #[serde(default = "default_true")]
    pub allow_any_origin: bool,

    /// Allowed origins when `allow_any_origin` is off
    #[serde(default)]
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            origins: Vec::new(),
        }
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/iris_model.json")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("models/model_metadata.json")
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_batch_size() -> usize {
    1000
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}
