//! Descriptive metadata stored next to a model artifact

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata describing a trained model.
///
/// Every key is optional on disk. Keys other than the three named fields are
/// kept verbatim as hyperparameters and only used for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Estimator family, e.g. `RandomForestClassifier`
    #[serde(default)]
    pub model_type: Option<String>,

    /// Feature names in column order (informational)
    #[serde(default)]
    pub feature_names: Vec<String>,

    /// Class labels indexed by predicted class integer
    #[serde(default)]
    pub target_names: Vec<String>,

    /// Opaque training parameters such as `n_estimators` or `max_depth`
    #[serde(flatten)]
    pub hyperparameters: BTreeMap<String, Value>,
}

impl ModelMetadata {
    /// Decode metadata from its JSON document
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Look up a hyperparameter by key
    pub fn hyperparameter(&self, key: &str) -> Option<&Value> {
        self.hyperparameters.get(key)
    }

    /// Label for a class index, if the metadata names it
    pub fn target_name(&self, index: usize) -> Option<&str> {
        self.target_names.get(index).map(String::as_str)
    }
}

/// Resolve the label for a predicted class index.
///
/// Falls back to `class_<index>` when there is no metadata or the index is
/// beyond `target_names`.
pub fn resolve_label(metadata: Option<&ModelMetadata>, index: usize) -> String {
    metadata
        .and_then(|m| m.target_name(index))
        .map(str::to_string)
        .unwrap_or_else(|| format!("class_{}", index))
}
