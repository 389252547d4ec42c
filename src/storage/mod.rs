//! Storage module
//!
//! The persistence collaborator: the whole note list is saved as one
//! JSON document under a single fixed key.

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::store::Note;

/// Key-value persistence contract for the note list.
///
/// Saves are fire-and-forget from the mutator's perspective: the notes
/// service logs failures and moves on, it never retries or surfaces them.
#[async_trait::async_trait]
pub trait NoteStorage: Send + Sync {
    /// Load all persisted notes; an absent store yields an empty list.
    async fn load(&self) -> Result<Vec<Note>>;

    /// Persist the full note list, replacing whatever was there.
    async fn save(&self, notes: &[Note]) -> Result<()>;
}
