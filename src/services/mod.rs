//! Services module
//!
//! Business logic services layered over the note store and its
//! collaborators.

pub mod ai;
pub mod encryption;
pub mod notes;

pub use ai::{AiOperation, AiOrchestrator, AiOutcome, AiProvider};
pub use encryption::{EncryptionFlow, EncryptionState, PromptMode};
pub use notes::NotesService;
