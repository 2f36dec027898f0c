//! Core types for feature vectors and prediction results

use serde::{Deserialize, Serialize};

/// Number of features the iris classifier consumes
pub const FEATURE_COUNT: usize = 4;

/// Request field names, in model column order
pub const FEATURE_FIELDS: [&str; FEATURE_COUNT] =
    ["sepal_length", "sepal_width", "petal_length", "petal_width"];

/// Unvalidated features as received on the wire.
///
/// Every field is optional so that an absent or `null` value surfaces as a
/// validation error instead of a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeatures {
    pub sepal_length: Option<f64>,
    pub sepal_width: Option<f64>,
    pub petal_length: Option<f64>,
    pub petal_width: Option<f64>,
}

impl RawFeatures {
    /// Build a fully populated raw payload
    pub fn new(sepal_length: f64, sepal_width: f64, petal_length: f64, petal_width: f64) -> Self {
        Self {
            sepal_length: Some(sepal_length),
            sepal_width: Some(sepal_width),
            petal_length: Some(petal_length),
            petal_width: Some(petal_width),
        }
    }

    /// Field values paired with their names, in model column order
    pub fn fields(&self) -> [(&'static str, Option<f64>); FEATURE_COUNT] {
        [
            (FEATURE_FIELDS[0], self.sepal_length),
            (FEATURE_FIELDS[1], self.sepal_width),
            (FEATURE_FIELDS[2], self.petal_length),
            (FEATURE_FIELDS[3], self.petal_width),
        ]
    }
}

/// A validated iris measurement.
///
/// Only the validator constructs this type, so every field is finite and
/// non-negative wherever a `FeatureVector` exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    sepal_length: f64,
    sepal_width: f64,
    petal_length: f64,
    petal_width: f64,
}

impl FeatureVector {
    pub(crate) fn from_validated(values: [f64; FEATURE_COUNT]) -> Self {
        let [sepal_length, sepal_width, petal_length, petal_width] = values;
        Self {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
        }
    }

    pub fn sepal_length(&self) -> f64 {
        self.sepal_length
    }

    pub fn sepal_width(&self) -> f64 {
        self.sepal_width
    }

    pub fn petal_length(&self) -> f64 {
        self.petal_length
    }

    pub fn petal_width(&self) -> f64 {
        self.petal_width
    }

    /// Values in model column order, ready to become a matrix row
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.sepal_length,
            self.sepal_width,
            self.petal_length,
            self.petal_width,
        ]
    }
}

/// Labeled prediction for a single sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Resolved class label
    pub prediction: String,

    /// Probability of the predicted class (0.0-1.0)
    pub probability: f64,

    /// Input features, echoed unchanged
    pub features: FeatureVector,
}

/// One entry of a batch response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    /// Zero-based position of the sample in the request
    pub sample_id: usize,

    #[serde(flatten)]
    pub result: PredictionResult,
}

/// Ordered predictions for a batch request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchPredictionResult {
    pub predictions: Vec<BatchItem>,
}

impl BatchPredictionResult {
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
