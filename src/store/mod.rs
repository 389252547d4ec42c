//! Note store module
//!
//! Model definitions and the in-memory note collection that owns
//! create/update/delete/search/sort and version history.

pub mod models;
pub mod note_store;

pub use models::{Note, NoteVersion, UpdateNote};
pub use note_store::NoteStore;
