//! Notes service
//!
//! High-level business logic for note operations: CRUD, encryption
//! toggles, version restore, and autosave coordination.
//!
//! Every mutation ends with an autosave that is fire-and-forget from
//! the caller's perspective: persistence failures are logged, never
//! surfaced, and never retried. Note mutations themselves are applied
//! before the save, so a storage outage costs durability, not state.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::services::encryption::{EncryptionFlow, EncryptionState, PromptMode};
use crate::storage::NoteStorage;
use crate::store::{Note, NoteStore, UpdateNote};

/// Service for managing notes.
pub struct NotesService {
    store: NoteStore,
    storage: Arc<dyn NoteStorage>,
    flow: EncryptionFlow,
}

impl NotesService {
    pub fn new(storage: Arc<dyn NoteStorage>) -> Self {
        Self {
            store: NoteStore::new(),
            storage,
            flow: EncryptionFlow::new(),
        }
    }

    /// Hydrate the store from persistence. A failed load is logged and
    /// the service starts empty rather than failing the application.
    pub async fn load(storage: Arc<dyn NoteStorage>) -> Self {
        let notes = match storage.load().await {
            Ok(notes) => notes,
            Err(e) => {
                tracing::warn!("Failed to load persisted notes, starting empty: {}", e);
                Vec::new()
            }
        };

        tracing::info!("Loaded {} notes", notes.len());
        Self {
            store: NoteStore::from_notes(notes),
            storage,
            flow: EncryptionFlow::new(),
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.store.active_id()
    }

    pub fn set_active(&mut self, id: Uuid) -> Result<()> {
        self.store.set_active(id)
    }

    pub fn get_note(&self, id: Uuid) -> Result<&Note> {
        self.store.get(id)
    }

    /// Display list: pinned first, then most recently updated.
    pub fn list_notes(&self) -> Vec<&Note> {
        self.store.sorted()
    }

    pub fn search_notes(&self, query: &str) -> Vec<&Note> {
        self.store.search(query)
    }

    /// Create a new note; it becomes the active note.
    pub async fn create_note(&mut self) -> Note {
        let note = self.store.create().clone();
        tracing::info!("Note created: {}", note.id);

        self.autosave().await;
        note
    }

    /// Apply a partial update to a note.
    pub async fn update_note(&mut self, id: Uuid, update: UpdateNote) -> Result<Note> {
        let note = self.store.update(id, update)?.clone();

        self.autosave().await;
        Ok(note)
    }

    /// Delete a note. If it was active, selection falls back to the
    /// next note in store order (or none). Returns the new active id.
    pub async fn delete_note(&mut self, id: Uuid) -> Result<Option<Uuid>> {
        let new_active = self.store.delete(id)?;
        self.flow.forget(id);
        tracing::info!("Note deleted: {}", id);

        self.autosave().await;
        Ok(new_active)
    }

    /// Restore a prior version snapshot of a note.
    pub async fn restore_version(&mut self, id: Uuid, version_id: Uuid) -> Result<Note> {
        let note = self.store.restore_version(id, version_id)?.clone();

        self.autosave().await;
        Ok(note)
    }

    // ===== Encryption workflow =====

    /// Current encryption state of a note, including any open prompt.
    pub fn encryption_state(&self, id: Uuid) -> Result<EncryptionState> {
        Ok(self.flow.state(self.store.get(id)?))
    }

    /// Begin an encryption toggle, opening a password prompt for the
    /// note. Replaces any prompt already open for it.
    pub fn toggle_encryption(&mut self, id: Uuid) -> Result<PromptMode> {
        self.flow.begin(self.store.get(id)?)
    }

    /// Submit the password for the note's open prompt. On success the
    /// note flips between plaintext and encrypted; on failure it is
    /// left untouched and the error is returned for display.
    pub async fn submit_password(&mut self, id: Uuid, password: &str) -> Result<EncryptionState> {
        let note = self.store.get_mut(id)?;
        let state = self.flow.submit(note, password)?;

        self.autosave().await;
        Ok(state)
    }

    /// Close the note's password prompt without changing anything.
    pub fn cancel_password(&mut self, id: Uuid) {
        self.flow.cancel(id);
    }

    /// Persist the full note list; failures are logged only.
    async fn autosave(&self) {
        if let Err(e) = self.storage.save(self.store.notes()).await {
            tracing::warn!("Autosave failed: {}", e);
        }
    }
}

impl std::fmt::Debug for NotesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesService")
            .field("notes", &self.store.len())
            .field("active_id", &self.store.active_id())
            .finish()
    }
}

/// Extract a note's plaintext for AI, translation, or word counts.
/// Rejected while the note is encrypted: ciphertext is opaque.
pub fn plaintext_of(note: &Note) -> Result<String> {
    if note.is_encrypted {
        return Err(AppError::NoteLocked(note.id.to_string()));
    }
    Ok(crate::richtext::strip_tags(&note.content))
}
