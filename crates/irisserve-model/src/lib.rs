//! IrisServe Model
//!
//! Everything between a model artifact on disk and a labeled prediction:
//! - `artifact`: the capability trait every model implements
//! - `forest`: the random-forest artifact read at startup
//! - `store`: load-once snapshot publication with atomic replacement
//! - `engine`: single and batch inference with label resolution
//! - `report`: readiness and metadata reporting

pub mod artifact;
pub mod engine;
pub mod forest;
pub mod metadata;
pub mod report;
pub mod store;

pub use artifact::{ArtifactError, ModelArtifact, Row};
pub use engine::{predict_batch, predict_one, InferenceEngine};
pub use forest::{DecisionTree, ForestError, RandomForest, TreeNode};
pub use metadata::{resolve_label, ModelMetadata};
pub use report::{health, model_info, HealthReport, MetadataSummary, ModelInfo, ModelParameters};
pub use store::{ModelSnapshot, SnapshotStore};

