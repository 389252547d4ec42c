//! JSON file persistence
//!
//! Stores the note list as a single versioned JSON document. Writes go
//! to a temp file first and are renamed into place so a crash mid-write
//! never leaves a torn store behind.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::NoteStorage;
use crate::config;
use crate::error::{AppError, Result};
use crate::store::Note;

/// Versioned on-disk envelope around the note list.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageEnvelope {
    schema_version: u32,
    notes: Vec<Note>,
}

/// File-backed note storage rooted at a directory.
#[derive(Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create a store that persists under the given root directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the backing directory if needed.
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create store dir: {}", e)))?;
        tracing::info!("Note store initialized at: {:?}", self.root);
        Ok(())
    }

    fn store_path(&self) -> PathBuf {
        self.root.join(config::STORAGE_FILE_NAME)
    }
}

#[async_trait::async_trait]
impl NoteStorage for JsonFileStore {
    async fn load(&self) -> Result<Vec<Note>> {
        let path = self.store_path();

        if !path.exists() {
            tracing::debug!("No persisted notes at {:?}", path);
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read note store: {}", e)))?;

        // Current format is a versioned envelope; the legacy format was
        // a bare array with no version field. Accept both; the next
        // save rewrites in the current format.
        let notes = match serde_json::from_str::<StorageEnvelope>(&raw) {
            Ok(envelope) => {
                if envelope.schema_version > config::SCHEMA_VERSION {
                    return Err(AppError::Storage(format!(
                        "Unsupported schema version: {}",
                        envelope.schema_version
                    )));
                }
                envelope.notes
            }
            Err(_) => serde_json::from_str::<Vec<Note>>(&raw)
                .map_err(|e| AppError::Storage(format!("Malformed note store: {}", e)))?,
        };

        tracing::debug!("Loaded {} notes from {:?}", notes.len(), path);
        Ok(notes)
    }

    async fn save(&self, notes: &[Note]) -> Result<()> {
        let envelope = StorageEnvelope {
            schema_version: config::SCHEMA_VERSION,
            notes: notes.to_vec(),
        };
        let json = serde_json::to_string(&envelope)?;

        let path = self.store_path();
        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create temp store: {}", e)))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write note store: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to sync note store: {}", e)))?;

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace note store: {}", e)))?;

        tracing::debug!("Saved {} notes to {:?}", notes.len(), path);
        Ok(())
    }
}
