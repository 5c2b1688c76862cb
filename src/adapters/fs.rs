//! Filesystem adapter: Implementation of ArtifactStore.
//!
//! Layout of the artifact directory:
//!
//! ```text
//! artifacts/
//!   model.json     serialized classifier
//!   scaler.json    fitted standard scaler
//!   manifest.json  model name plus SHA-256 of both files
//! ```
//!
//! The manifest is written last, so a reader never pairs a new model with
//! an old scaler: any mismatch fails the checksum check on load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::StandardScaler;
use crate::ports::{ArtifactBundle, ArtifactStore};

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Error type for artifact operations.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    Missing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("Malformed {file}: {reason}")]
    Malformed { file: String, reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    model_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    /// File name to hex SHA-256
    files: BTreeMap<String, String>,
}

/// Artifact store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write via a temporary sibling and rename into place.
    fn write_atomic(&self, file: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let target = self.path(file);
        let tmp = self.path(&format!(".{file}.tmp"));
        fs::write(&tmp, bytes).map_err(|source| ArtifactError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &target).map_err(|source| ArtifactError::Io {
            path: target,
            source,
        })
    }

    fn read(&self, file: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.path(file);
        fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ArtifactError::Missing(path)
            } else {
                ArtifactError::Io { path, source }
            }
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    type Error = ArtifactError;

    fn save(&self, bundle: &ArtifactBundle) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let scaler_bytes =
            serde_json::to_vec_pretty(&bundle.scaler).map_err(|e| ArtifactError::Malformed {
                file: SCALER_FILE.to_string(),
                reason: e.to_string(),
            })?;

        self.write_atomic(MODEL_FILE, &bundle.model_blob)?;
        self.write_atomic(SCALER_FILE, &scaler_bytes)?;

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            model_name: bundle.model_name.clone(),
            created_at: chrono::Utc::now(),
            files: BTreeMap::from([
                (MODEL_FILE.to_string(), sha256_hex(&bundle.model_blob)),
                (SCALER_FILE.to_string(), sha256_hex(&scaler_bytes)),
            ]),
        };
        let manifest_bytes =
            serde_json::to_vec_pretty(&manifest).map_err(|e| ArtifactError::Malformed {
                file: MANIFEST_FILE.to_string(),
                reason: e.to_string(),
            })?;
        self.write_atomic(MANIFEST_FILE, &manifest_bytes)?;

        tracing::info!(
            dir = %self.dir.display(),
            model = %bundle.model_name,
            "Saved artifacts"
        );
        Ok(())
    }

    fn load(&self) -> Result<ArtifactBundle, Self::Error> {
        let manifest: Manifest = serde_json::from_slice(&self.read(MANIFEST_FILE)?).map_err(
            |e| ArtifactError::Malformed {
                file: MANIFEST_FILE.to_string(),
                reason: e.to_string(),
            },
        )?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ArtifactError::Malformed {
                file: MANIFEST_FILE.to_string(),
                reason: format!("unsupported version {}", manifest.version),
            });
        }

        let model_blob = self.read(MODEL_FILE)?;
        verify(&manifest, MODEL_FILE, &model_blob)?;

        let scaler_bytes = self.read(SCALER_FILE)?;
        verify(&manifest, SCALER_FILE, &scaler_bytes)?;

        let scaler: StandardScaler =
            serde_json::from_slice(&scaler_bytes).map_err(|e| ArtifactError::Malformed {
                file: SCALER_FILE.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            dir = %self.dir.display(),
            model = %manifest.model_name,
            created_at = %manifest.created_at,
            "Loaded artifacts"
        );

        Ok(ArtifactBundle {
            model_name: manifest.model_name,
            model_blob,
            scaler,
        })
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn verify(manifest: &Manifest, file: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
    let expected = manifest
        .files
        .get(file)
        .ok_or_else(|| ArtifactError::Malformed {
            file: MANIFEST_FILE.to_string(),
            reason: format!("no checksum for {file}"),
        })?;

    if *expected != sha256_hex(bytes) {
        return Err(ArtifactError::ChecksumMismatch(file.to_string()));
    }
    Ok(())
}
