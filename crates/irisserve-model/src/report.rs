//! Health and model info reporting
//!
//! Pure reads of the snapshot store; nothing here runs inference.

use crate::metadata::ModelMetadata;
use crate::store::SnapshotStore;
use irisserve_core::InfoError;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Short description of the loaded model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataSummary {
    pub model_type: Option<String>,
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
}

impl From<&ModelMetadata> for MetadataSummary {
    fn from(metadata: &ModelMetadata) -> Self {
        Self {
            model_type: metadata.model_type.clone(),
            feature_names: metadata.feature_names.clone(),
            target_names: metadata.target_names.clone(),
        }
    }
}

/// Readiness of the service
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    /// True iff a snapshot is published
    pub ready: bool,

    /// Present when the snapshot carries metadata
    pub metadata_summary: Option<MetadataSummary>,
}

/// Training parameters reported by `model_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelParameters {
    pub n_estimators: Value,
    pub max_depth: Value,

    /// Any other hyperparameters found in the metadata
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// Full model description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_type: Option<String>,
    pub feature_names: Vec<String>,
    pub target_names: Vec<String>,
    pub model_parameters: ModelParameters,
}

/// Report readiness and, when available, a metadata summary
pub fn health(store: &SnapshotStore) -> HealthReport {
    let snapshot = store.current();

    HealthReport {
        ready: snapshot.is_some(),
        metadata_summary: snapshot
            .as_deref()
            .and_then(|s| s.metadata())
            .map(MetadataSummary::from),
    }
}

/// Report full metadata of the loaded model
pub fn model_info(store: &SnapshotStore) -> Result<ModelInfo, InfoError> {
    let snapshot = store.current().ok_or(InfoError::MetadataUnavailable)?;
    let metadata = snapshot.metadata().ok_or(InfoError::MetadataUnavailable)?;

    let mut other = metadata.hyperparameters.clone();
    let n_estimators = other.remove("n_estimators").unwrap_or(Value::Null);
    let max_depth = other.remove("max_depth").unwrap_or(Value::Null);

    Ok(ModelInfo {
        model_type: metadata.model_type.clone(),
        feature_names: metadata.feature_names.clone(),
        target_names: metadata.target_names.clone(),
        model_parameters: ModelParameters {
            n_estimators,
            max_depth,
            other,
        },
    })
}
