//! Inference engine
//!
//! Turns validated features into labeled predictions against a snapshot.
//! A batch is evaluated with exactly one `predict` and one
//! `predict_probability` call on the artifact; rows are mapped back to
//! results by position. Failures are returned to the caller, which logs
//! them with the operation it was serving.

use crate::artifact::Row;
use crate::metadata::resolve_label;
use crate::store::{ModelSnapshot, SnapshotStore};
use irisserve_core::{
    BatchItem, BatchPredictionResult, FeatureVector, InferenceError, PredictionResult,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Predict a single sample
pub fn predict_one(
    snapshot: Option<&ModelSnapshot>,
    features: &FeatureVector,
) -> Result<PredictionResult, InferenceError> {
    let snapshot = snapshot.ok_or(InferenceError::ModelUnavailable)?;

    let result = infer(snapshot, std::slice::from_ref(features))?
        .pop()
        .ok_or_else(|| InferenceError::invalid_output("no prediction for single sample"))?;

    info!(
        "Prediction made: {} (confidence: {:.4})",
        result.prediction, result.probability
    );
    Ok(result)
}

/// Predict an ordered batch of samples.
///
/// `sample_id` of each result is the zero-based position of its input. An
/// empty batch yields an empty result without touching the artifact.
pub fn predict_batch(
    snapshot: Option<&ModelSnapshot>,
    features: &[FeatureVector],
) -> Result<BatchPredictionResult, InferenceError> {
    let snapshot = snapshot.ok_or(InferenceError::ModelUnavailable)?;

    if features.is_empty() {
        debug!("Empty batch, skipping inference");
        return Ok(BatchPredictionResult::default());
    }

    let results = infer(snapshot, features)?;

    let predictions = results
        .into_iter()
        .enumerate()
        .map(|(sample_id, result)| BatchItem { sample_id, result })
        .collect::<Vec<_>>();

    info!("Batch prediction completed: {} samples", predictions.len());
    Ok(BatchPredictionResult { predictions })
}

/// Run the artifact once over all rows and label each row
fn infer(
    snapshot: &ModelSnapshot,
    features: &[FeatureVector],
) -> Result<Vec<PredictionResult>, InferenceError> {
    let artifact = snapshot.artifact();
    let batch: Vec<Row> = features.iter().map(FeatureVector::to_row).collect();

    let classes = artifact
        .predict(&batch)
        .map_err(|e| InferenceError::artifact("predict", e))?;
    let probabilities = artifact
        .predict_probability(&batch)
        .map_err(|e| InferenceError::artifact("predict_probability", e))?;

    if classes.len() != batch.len() || probabilities.len() != batch.len() {
        return Err(InferenceError::invalid_output(format!(
            "expected {} rows, got {} class indices and {} probability rows",
            batch.len(),
            classes.len(),
            probabilities.len()
        )));
    }

    features
        .iter()
        .zip(classes)
        .zip(&probabilities)
        .enumerate()
        .map(|(row, ((input, class), distribution))| {
            let probability = *distribution.get(class).ok_or_else(|| {
                InferenceError::invalid_output(format!(
                    "row {}: class {} outside probability row of width {}",
                    row,
                    class,
                    distribution.len()
                ))
            })?;

            if !(0.0..=1.0).contains(&probability) {
                return Err(InferenceError::invalid_output(format!(
                    "row {}: probability {} outside [0, 1]",
                    row, probability
                )));
            }

            Ok(PredictionResult {
                prediction: resolve_label(snapshot.metadata(), class),
                probability,
                features: *input,
            })
        })
        .collect()
}

/// Inference entry point bound to a snapshot store.
///
/// Each call reads the current snapshot once and holds it until the call
/// completes, so a concurrent publish never changes the model mid-batch.
#[derive(Clone)]
pub struct InferenceEngine {
    store: Arc<SnapshotStore>,
}

impl InferenceEngine {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Store this engine reads snapshots from
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Predict a single sample against the current snapshot
    pub fn predict_one(&self, features: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let snapshot = self.store.current();
        predict_one(snapshot.as_deref(), features)
    }

    /// Predict a batch against the current snapshot
    pub fn predict_batch(
        &self,
        features: &[FeatureVector],
    ) -> Result<BatchPredictionResult, InferenceError> {
        let snapshot = self.store.current();
        predict_batch(snapshot.as_deref(), features)
    }
}
