//! IrisServe Server
//!
//! HTTP surface for the iris classifier: startup model load, feature
//! validation at the boundary, and JSON prediction endpoints.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::{CorsConfig, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
