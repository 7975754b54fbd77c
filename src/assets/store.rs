//! Filesystem layout for model assets and staged user images.
//!
//! Everything lives under the user documents directory:
//! `<documents>/cpm/` holds the model files, `<documents>/temp/` holds the
//! transient staging copy of the last picked image.

use std::path::PathBuf;

use log::{error, warn};

use super::catalog::{catalog_entry, AssetKind};

const MODEL_DIR_NAME: &str = "cpm";
const TEMP_DIR_NAME: &str = "temp";
const STAGED_IMAGE_NAME: &str = "image.jpg";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user documents directory is unavailable")]
    DocumentsDirUnavailable,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves local paths for required assets and reports their presence.
///
/// A missing asset is an expected state, never an error; readiness
/// recomputation is what reacts to absence.
#[derive(Debug, Clone)]
pub struct AssetStore {
    documents_dir: PathBuf,
}

impl AssetStore {
    pub fn new(documents_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir: documents_dir.into(),
        }
    }

    /// Store rooted at the platform documents directory.
    pub fn from_user_documents() -> Result<Self, StoreError> {
        dirs::document_dir()
            .map(Self::new)
            .ok_or(StoreError::DocumentsDirUnavailable)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.documents_dir.join(MODEL_DIR_NAME)
    }

    /// Deterministic local path for an asset kind.
    pub fn local_path_for(&self, kind: AssetKind) -> PathBuf {
        self.model_dir().join(catalog_entry(kind).filename)
    }

    pub fn exists(&self, kind: AssetKind) -> bool {
        self.local_path_for(kind).exists()
    }

    pub fn all_present(&self) -> bool {
        AssetKind::ALL.iter().all(|kind| self.exists(*kind))
    }

    /// Create the model directory if it is missing.
    ///
    /// Failure is logged, not fatal: a download against the missing
    /// directory fails later through its own error path.
    pub fn ensure_model_dir(&self) {
        let dir = self.model_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            error!("Unable to create model directory {:?}: {}", dir, e);
        }
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.documents_dir.join(TEMP_DIR_NAME)
    }

    /// Write user-supplied image bytes to the staging file and return its
    /// path, creating the staging directory on first use. Each call
    /// overwrites the previous staged image.
    pub fn stage_image(&self, data: &[u8]) -> Result<PathBuf, StoreError> {
        let dir = self.temp_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(STAGED_IMAGE_NAME);
        std::fs::write(&path, data)?;
        Ok(path)
    }

    /// Best-effort removal of staged files; errors are logged and ignored.
    pub fn clear_temp_dir(&self) {
        let dir = self.temp_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return, // nothing staged yet
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            if let Err(e) = result {
                warn!("Failed to remove staged file {:?}: {}", path, e);
            }
        }
    }
}
