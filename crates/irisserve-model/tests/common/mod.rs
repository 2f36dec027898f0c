//! Shared fixtures for model integration tests
//!
//! Provides the bundled iris artifact and configurable mock artifacts for
//! exercising the engine's error paths.

#![allow(dead_code)]

use irisserve_core::{validate, FeatureVector, RawFeatures};
use irisserve_model::{ArtifactError, ModelArtifact, Row, SnapshotStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Directory holding the bundled sample model
pub fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../models")
}

/// Store with the bundled iris forest and metadata loaded
pub fn iris_store() -> Arc<SnapshotStore> {
    let dir = models_dir();
    let store = SnapshotStore::new();
    store
        .load(dir.join("iris_model.json"), dir.join("model_metadata.json"))
        .expect("bundled iris model should load");
    Arc::new(store)
}

/// Validated features, panicking on invalid input
pub fn features(sepal_length: f64, sepal_width: f64, petal_length: f64, petal_width: f64) -> FeatureVector {
    validate(&RawFeatures::new(sepal_length, sepal_width, petal_length, petal_width))
        .expect("test features should be valid")
}

/// An artifact that counts calls and predicts class 0 with certainty
pub struct CountingArtifact {
    n_classes: usize,
    predict_calls: AtomicU32,
    probability_calls: AtomicU32,
    rows_seen: AtomicU32,
}

impl CountingArtifact {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            predict_calls: AtomicU32::new(0),
            probability_calls: AtomicU32::new(0),
            rows_seen: AtomicU32::new(0),
        }
    }

    /// Number of `predict` invocations
    pub fn predict_calls(&self) -> u32 {
        self.predict_calls.load(Ordering::Relaxed)
    }

    /// Number of `predict_probability` invocations
    pub fn probability_calls(&self) -> u32 {
        self.probability_calls.load(Ordering::Relaxed)
    }

    /// Total rows passed to `predict`
    pub fn rows_seen(&self) -> u32 {
        self.rows_seen.load(Ordering::Relaxed)
    }
}

impl ModelArtifact for CountingArtifact {
    fn predict(&self, batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        self.predict_calls.fetch_add(1, Ordering::Relaxed);
        self.rows_seen.fetch_add(batch.len() as u32, Ordering::Relaxed);
        Ok(vec![0; batch.len()])
    }

    fn predict_probability(&self, batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        self.probability_calls.fetch_add(1, Ordering::Relaxed);
        let mut row = vec![0.0; self.n_classes];
        row[0] = 1.0;
        Ok(vec![row; batch.len()])
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// An artifact that always fails - for testing error paths
pub struct FailingArtifact {
    message: String,
}

impl FailingArtifact {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl ModelArtifact for FailingArtifact {
    fn predict(&self, _batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        Err(ArtifactError::internal(self.message.clone()))
    }

    fn predict_probability(&self, _batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        Err(ArtifactError::internal(self.message.clone()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// An artifact that predicts the class given by the rounded first feature
pub struct EchoArtifact {
    n_classes: usize,
}

impl EchoArtifact {
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes }
    }

    fn class_of(&self, row: &[f64]) -> usize {
        (row[0].round() as usize) % self.n_classes
    }
}

impl ModelArtifact for EchoArtifact {
    fn predict(&self, batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        Ok(batch.iter().map(|row| self.class_of(row)).collect())
    }

    fn predict_probability(&self, batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        Ok(batch
            .iter()
            .map(|row| {
                let mut p = vec![0.0; self.n_classes];
                p[self.class_of(row)] = 1.0;
                p
            })
            .collect())
    }

    fn name(&self) -> &str {
        "echo"
    }
}
