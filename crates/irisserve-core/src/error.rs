//! Error types for IrisServe

use std::path::PathBuf;

/// Result type alias using IrisServe's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for IrisServe operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model artifact or metadata could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Request features were rejected
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Prediction could not be produced
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Model metadata could not be reported
    #[error(transparent)]
    Info(#[from] InfoError),
}

/// Failures while loading a model snapshot.
///
/// A load failure never disturbs a previously published snapshot.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The artifact file does not exist
    #[error("model artifact not found at {}", path.display())]
    ArtifactMissing { path: PathBuf },

    /// The artifact file exists but could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be decoded into a model
    #[error("invalid model artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    /// The metadata file exists but is not valid metadata JSON
    #[error("invalid model metadata {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejections produced by the feature validator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required feature was absent or null
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A feature was negative, NaN, or infinite
    #[error("field '{field}' must be a finite number >= 0, got {value}")]
    OutOfDomain { field: &'static str, value: f64 },

    /// A batch item failed validation
    #[error("sample {index}: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    /// A batch exceeded the configured size limit
    #[error("batch of {size} samples exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// The request body was not a well-formed feature payload
    #[error("malformed request body: {0}")]
    Malformed(String),
}

impl ValidationError {
    /// Name of the offending field, if the error is tied to one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field } | Self::OutOfDomain { field, .. } => Some(*field),
            Self::InBatch { source, .. } => source.field(),
            Self::BatchTooLarge { .. } | Self::Malformed(_) => None,
        }
    }
}

/// Failures raised while running inference
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// No model snapshot has been published
    #[error("model not loaded")]
    ModelUnavailable,

    /// The artifact itself raised an error
    #[error("{operation} failed: {cause}")]
    Artifact {
        operation: &'static str,
        cause: String,
    },

    /// The artifact returned output that breaks its contract
    #[error("artifact returned invalid output: {0}")]
    InvalidOutput(String),
}

impl InferenceError {
    /// Create a new artifact error
    pub fn artifact(operation: &'static str, cause: impl ToString) -> Self {
        Self::Artifact {
            operation,
            cause: cause.to_string(),
        }
    }

    /// Create a new invalid output error
    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Self::InvalidOutput(msg.into())
    }
}

/// Failures while reporting model metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InfoError {
    /// No snapshot is loaded, or it carries no metadata
    #[error("model metadata not available")]
    MetadataUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_error_reports_inner_field() {
        let err = ValidationError::InBatch {
            index: 1,
            source: Box::new(ValidationError::OutOfDomain {
                field: "sepal_length",
                value: -1.0,
            }),
        };

        assert_eq!(err.field(), Some("sepal_length"));
        assert_eq!(
            err.to_string(),
            "sample 1: field 'sepal_length' must be a finite number >= 0, got -1"
        );
    }

    #[test]
    fn test_umbrella_conversion() {
        let err: Error = InferenceError::ModelUnavailable.into();
        assert!(matches!(err, Error::Inference(InferenceError::ModelUnavailable)));
        assert_eq!(err.to_string(), "model not loaded");
    }
}
