use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "irisserve")]
#[command(version, about = "Iris flower classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml", env = "IRISSERVE_CONFIG")]
    pub config: String,

    /// Model artifact path
    #[arg(short, long, env = "IRISSERVE_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Model metadata path
    #[arg(long, env = "IRISSERVE_METADATA_PATH")]
    pub metadata: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long, env = "IRISSERVE_LISTEN")]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "IRISSERVE_PORT")]
    pub port: Option<u16>,

    /// Maximum number of samples per batch request
    #[arg(long, env = "IRISSERVE_MAX_BATCH_SIZE")]
    pub max_batch_size: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}
