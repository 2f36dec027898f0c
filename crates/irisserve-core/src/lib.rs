//! IrisServe Core
//!
//! Core types, validation, and error handling shared across IrisServe
//! components.
//!
//! This crate provides:
//! - Feature vectors and the labeled prediction types returned to callers
//! - The feature validator that gatekeeps every request
//! - Per-operation error types and the umbrella `Error`

pub mod error;
pub mod types;
pub mod validate;

pub use error::{Error, InferenceError, InfoError, LoadError, Result, ValidationError};
pub use types::{
    BatchItem, BatchPredictionResult, FeatureVector, PredictionResult, RawFeatures,
    FEATURE_COUNT, FEATURE_FIELDS,
};
pub use validate::{validate, validate_batch};

