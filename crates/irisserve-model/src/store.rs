//! Model snapshot store
//!
//! Owns the currently published [`ModelSnapshot`]. A snapshot is built off to
//! the side and published with a single pointer swap, so readers see either
//! no snapshot or a complete one.

use crate::artifact::ModelArtifact;
use crate::forest::RandomForest;
use crate::metadata::ModelMetadata;
use chrono::{DateTime, Utc};
use irisserve_core::LoadError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Immutable pairing of a loaded artifact with its metadata
pub struct ModelSnapshot {
    artifact: Arc<dyn ModelArtifact>,
    metadata: Option<ModelMetadata>,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl ModelSnapshot {
    /// Create a snapshot from an in-memory artifact
    pub fn new(artifact: Arc<dyn ModelArtifact>, metadata: Option<ModelMetadata>) -> Self {
        Self {
            artifact,
            metadata,
            source: None,
            loaded_at: Utc::now(),
        }
    }

    /// Record the file the artifact was read from
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn artifact(&self) -> &dyn ModelArtifact {
        self.artifact.as_ref()
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl std::fmt::Debug for ModelSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSnapshot")
            .field("artifact", &self.artifact.name())
            .field("metadata", &self.metadata)
            .field("source", &self.source)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Holder of the current snapshot.
///
/// The lock guards only the pointer: readers clone the `Arc` and release it
/// before doing any work with the snapshot. Writes happen once per load, so
/// the per-request read lock is uncontended in practice.
#[derive(Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<ModelSnapshot>>>,
}

impl SnapshotStore {
    /// Create an empty store; nothing is served until a load succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a snapshot already published
    pub fn with_snapshot(snapshot: ModelSnapshot) -> Self {
        let store = Self::new();
        store.publish(snapshot);
        store
    }

    /// Load a random-forest artifact and its optional metadata, then publish.
    pub fn load(
        &self,
        artifact_path: impl AsRef<Path>,
        metadata_path: impl AsRef<Path>,
    ) -> Result<Arc<ModelSnapshot>, LoadError> {
        self.load_with(artifact_path, metadata_path, |bytes| {
            let forest = RandomForest::from_slice(bytes).map_err(|e| e.to_string())?;
            info!(
                trees = forest.n_trees(),
                features = forest.n_features(),
                classes = forest.n_classes(),
                "Decoded random forest"
            );
            Ok(Arc::new(forest) as Arc<dyn ModelArtifact>)
        })
    }

    /// Load with a caller-supplied artifact decoder, then publish.
    ///
    /// The artifact must exist; a missing metadata file yields a snapshot
    /// without metadata. On any failure the current snapshot is left as is.
    pub fn load_with<F>(
        &self,
        artifact_path: impl AsRef<Path>,
        metadata_path: impl AsRef<Path>,
        decode: F,
    ) -> Result<Arc<ModelSnapshot>, LoadError>
    where
        F: FnOnce(&[u8]) -> Result<Arc<dyn ModelArtifact>, String>,
    {
        let artifact_path = artifact_path.as_ref();
        let metadata_path = metadata_path.as_ref();

        let result = build_snapshot(artifact_path, metadata_path, decode);
        match result {
            Ok(snapshot) => {
                info!(
                    artifact = %artifact_path.display(),
                    kind = snapshot.artifact().name(),
                    has_metadata = snapshot.metadata().is_some(),
                    loaded_at = %snapshot.loaded_at(),
                    "Model loaded successfully"
                );
                Ok(self.publish(snapshot))
            }
            Err(e) => {
                error!(artifact = %artifact_path.display(), "Failed to load model: {}", e);
                if self.is_loaded() {
                    warn!("Keeping previously loaded model");
                }
                Err(e)
            }
        }
    }

    /// Atomically replace the current snapshot
    pub fn publish(&self, snapshot: ModelSnapshot) -> Arc<ModelSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Latest published snapshot, if any
    pub fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.current.read().clone()
    }

    /// Whether a snapshot has been published
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

fn build_snapshot<F>(
    artifact_path: &Path,
    metadata_path: &Path,
    decode: F,
) -> Result<ModelSnapshot, LoadError>
where
    F: FnOnce(&[u8]) -> Result<Arc<dyn ModelArtifact>, String>,
{
    if !artifact_path.exists() {
        return Err(LoadError::ArtifactMissing {
            path: artifact_path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(artifact_path).map_err(|source| LoadError::Io {
        path: artifact_path.to_path_buf(),
        source,
    })?;
    let artifact = decode(&bytes).map_err(|reason| LoadError::Artifact {
        path: artifact_path.to_path_buf(),
        reason,
    })?;

    let metadata = if metadata_path.exists() {
        let bytes = std::fs::read(metadata_path).map_err(|source| LoadError::Io {
            path: metadata_path.to_path_buf(),
            source,
        })?;
        let metadata = ModelMetadata::from_slice(&bytes).map_err(|source| LoadError::Metadata {
            path: metadata_path.to_path_buf(),
            source,
        })?;
        info!(metadata = %metadata_path.display(), "Metadata loaded successfully");
        Some(metadata)
    } else {
        warn!(
            metadata = %metadata_path.display(),
            "Metadata file not found, labels will fall back to class indices"
        );
        None
    };

    Ok(ModelSnapshot::new(artifact, metadata).with_source(artifact_path))
}
