//! In-memory note storage for tests
//!
//! Mirrors the file store's contract without touching disk, with a
//! failure toggle to exercise the log-only autosave path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::NoteStorage;
use crate::error::{AppError, Result};
use crate::store::Note;

#[derive(Default)]
pub struct MemoryStore {
    notes: Mutex<Vec<Note>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with a storage error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of notes currently persisted.
    pub fn persisted_count(&self) -> usize {
        self.notes.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl NoteStorage for MemoryStore {
    async fn load(&self) -> Result<Vec<Note>> {
        Ok(self.notes.lock().unwrap().clone())
    }

    async fn save(&self, notes: &[Note]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::Storage("store unavailable".to_string()));
        }
        *self.notes.lock().unwrap() = notes.to_vec();
        Ok(())
    }
}
