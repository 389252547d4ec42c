//! Encryption state machine
//!
//! Gates every transition between plaintext and encrypted note states.
//! A note is in one of three states: `Plain`, `PendingPassword` (a
//! prompt is open, either to set a password or to unlock), or
//! `Encrypted`. Content is only ever swapped after the crypto call
//! fully succeeds, so a failed transition leaves the note untouched.

use std::collections::HashMap;
use uuid::Uuid;

use crate::crypto;
use crate::error::{AppError, Result};
use crate::store::Note;

/// What the open password prompt is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Setting a password to encrypt a plaintext note.
    Set,
    /// Entering the password to decrypt an encrypted note.
    Unlock,
}

/// Observable per-note encryption state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionState {
    Plain,
    PendingPassword(PromptMode),
    Encrypted,
}

/// Tracks at most one pending password prompt per note.
///
/// There is no queue: beginning a toggle while a prompt is already open
/// for that note replaces the earlier prompt.
#[derive(Default)]
pub struct EncryptionFlow {
    pending: HashMap<Uuid, PromptMode>,
}

impl EncryptionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a note, including any open prompt.
    pub fn state(&self, note: &Note) -> EncryptionState {
        match self.pending.get(&note.id) {
            Some(mode) => EncryptionState::PendingPassword(*mode),
            None if note.is_encrypted => EncryptionState::Encrypted,
            None => EncryptionState::Plain,
        }
    }

    /// Begin an encryption toggle, opening a password prompt.
    ///
    /// A plaintext note must have real content: encrypting an empty or
    /// placeholder note is rejected before any prompt opens.
    pub fn begin(&mut self, note: &Note) -> Result<PromptMode> {
        let mode = if note.is_encrypted {
            PromptMode::Unlock
        } else {
            if note.is_empty() {
                return Err(AppError::EmptyContent);
            }
            PromptMode::Set
        };

        self.pending.insert(note.id, mode);
        tracing::debug!("Password prompt opened for note {} ({:?})", note.id, mode);
        Ok(mode)
    }

    /// Submit the password for the open prompt, completing the toggle.
    ///
    /// On success the note's content, `is_encrypted` flag, and
    /// `updated_at` change together. On failure the note is left
    /// exactly as it was and the prompt is closed; the caller may
    /// begin a new toggle for another attempt (unlimited retries).
    pub fn submit(&mut self, note: &mut Note, password: &str) -> Result<EncryptionState> {
        let mode = self
            .pending
            .remove(&note.id)
            .ok_or_else(|| AppError::Generic("No password prompt is open".to_string()))?;

        match mode {
            PromptMode::Set => {
                let ciphertext = crypto::encrypt(&note.content, password)?;
                note.content = ciphertext;
                note.is_encrypted = true;
                note.touch();
                tracing::info!("Note encrypted: {}", note.id);
                Ok(EncryptionState::Encrypted)
            }
            PromptMode::Unlock => {
                let plaintext = crypto::decrypt(&note.content, password)?;
                note.content = plaintext;
                note.is_encrypted = false;
                note.touch();
                tracing::info!("Note decrypted: {}", note.id);
                Ok(EncryptionState::Plain)
            }
        }
    }

    /// Close the prompt without touching the note.
    pub fn cancel(&mut self, note_id: Uuid) {
        if self.pending.remove(&note_id).is_some() {
            tracing::debug!("Password prompt cancelled for note {}", note_id);
        }
    }

    /// Drop any pending prompt for a deleted note.
    pub fn forget(&mut self, note_id: Uuid) {
        self.pending.remove(&note_id);
    }
}
