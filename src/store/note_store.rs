//! In-memory note collection
//!
//! This is the single owner of the note list: CRUD, search, ordering,
//! version history, and active-note selection all go through here.
//! Persistence is a separate collaborator layered on top by the
//! notes service.

use uuid::Uuid;

use super::models::{Note, UpdateNote};
use crate::config;
use crate::error::{AppError, Result};
use crate::richtext;

/// The in-memory note collection.
pub struct NoteStore {
    notes: Vec<Note>,
    active_id: Option<Uuid>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            active_id: None,
        }
    }

    /// Hydrate the store from persisted notes. The first note in store
    /// order becomes active.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let active_id = notes.first().map(|n| n.id);
        Self { notes, active_id }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn set_active(&mut self, id: Uuid) -> Result<()> {
        self.get(id)?;
        self.active_id = Some(id);
        Ok(())
    }

    /// Create a new note with default title and placeholder content.
    /// It is inserted at the front of the store and becomes active.
    pub fn create(&mut self) -> &Note {
        let note = Note::new();
        let id = note.id;
        self.notes.insert(0, note);
        self.active_id = Some(id);

        tracing::debug!("Created note: {}", id);
        &self.notes[0]
    }

    pub fn get(&self, id: Uuid) -> Result<&Note> {
        self.notes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }

    /// Apply a partial update to a note.
    ///
    /// Content and tag changes are rejected while the note is encrypted
    /// (ciphertext must never be edited in place); title and pin are
    /// metadata and stay editable. A content change snapshots the prior
    /// state into the version history first, and auto-derives the title
    /// when it still carries the creation placeholder.
    pub fn update(&mut self, id: Uuid, update: UpdateNote) -> Result<&Note> {
        let max_title = config::MAX_DERIVED_TITLE_LEN;
        let note = self.get_mut(id)?;

        if note.is_encrypted && (update.content.is_some() || update.tags.is_some()) {
            return Err(AppError::NoteLocked(id.to_string()));
        }

        let mut changed = false;

        if let Some(content) = update.content {
            if content != note.content {
                push_version(note);
                note.content = content;
                if update.title.is_none() && note.title == config::DEFAULT_NOTE_TITLE {
                    if let Some(title) = richtext::derive_title(&note.content, max_title) {
                        note.title = title;
                    }
                }
                changed = true;
            }
        }

        if let Some(title) = update.title {
            if title != note.title {
                note.title = title;
                changed = true;
            }
        }

        if let Some(tags) = update.tags {
            if tags != note.tags {
                note.tags = tags;
                changed = true;
            }
        }

        if let Some(pinned) = update.is_pinned {
            if pinned != note.is_pinned {
                note.is_pinned = pinned;
                changed = true;
            }
        }

        if changed {
            note.touch();
            tracing::debug!("Updated note: {}", id);
        }

        Ok(&*note)
    }

    /// Delete a note. If it was the active note, selection falls back to
    /// the next note in store order, else the previous one, else none.
    /// Returns the new active id.
    pub fn delete(&mut self, id: Uuid) -> Result<Option<Uuid>> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;

        self.notes.remove(index);
        tracing::debug!("Deleted note: {}", id);

        if self.active_id == Some(id) {
            self.active_id = self
                .notes
                .get(index)
                .or_else(|| self.notes.get(index.wrapping_sub(1)))
                .map(|n| n.id);
        }

        Ok(self.active_id)
    }

    /// Case-insensitive search. Titles match for every note; content
    /// matches only for plaintext notes — encrypted content is opaque
    /// and is never scanned.
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let query = query.to_lowercase();

        self.notes
            .iter()
            .filter(|note| {
                if note.title.to_lowercase().contains(&query) {
                    return true;
                }
                !note.is_encrypted
                    && richtext::strip_tags(&note.content)
                        .to_lowercase()
                        .contains(&query)
            })
            .collect()
    }

    /// Display ordering: pinned notes first, then most recently updated.
    pub fn sorted(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at))
        });
        notes
    }

    /// Restore a version snapshot: the current state is snapshotted
    /// first, then the version's title/content/tags are applied.
    /// Rejected while the note is encrypted — unlock first.
    pub fn restore_version(&mut self, id: Uuid, version_id: Uuid) -> Result<&Note> {
        let note = self.get_mut(id)?;

        if note.is_encrypted {
            return Err(AppError::NoteLocked(id.to_string()));
        }

        let version = note
            .versions
            .iter()
            .find(|v| v.version_id == version_id)
            .cloned()
            .ok_or_else(|| AppError::Generic(format!("Version not found: {}", version_id)))?;

        push_version(note);
        note.title = version.title;
        note.content = version.content;
        note.tags = version.tags;
        note.touch();

        tracing::debug!("Restored note {} to version {}", id, version_id);
        Ok(&*note)
    }
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Push a snapshot of the note's current state to the front of its
/// version list, evicting the oldest entry beyond the cap.
fn push_version(note: &mut Note) {
    let snapshot = note.snapshot();
    note.versions.insert(0, snapshot);
    note.versions.truncate(config::MAX_VERSIONS_PER_NOTE);
}
