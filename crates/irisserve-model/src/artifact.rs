//! Model artifact capability trait

/// A single input row, one value per feature in model column order
pub type Row = Vec<f64>;

/// Trait for all loaded model artifacts.
///
/// The inference engine depends only on this capability; concrete artifact
/// formats live behind it.
pub trait ModelArtifact: Send + Sync {
    /// Predict a class index for every row of the batch
    fn predict(&self, batch: &[Row]) -> Result<Vec<usize>, ArtifactError>;

    /// Predict the full class distribution for every row of the batch
    fn predict_probability(&self, batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError>;

    /// Get the artifact kind, used in logs
    fn name(&self) -> &str;
}

/// Errors raised by an artifact while evaluating a batch
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    /// A row does not have the number of features the model was trained on
    #[error("row {row} has {actual} features, model expects {expected}")]
    Shape {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Any other failure inside the artifact
    #[error("{0}")]
    Internal(String),
}

impl ArtifactError {
    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
