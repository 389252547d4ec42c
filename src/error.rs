//! Error types for the QuillVault core
//!
//! All errors use thiserror for structured error handling.
//! Every failure is caught at the operation boundary; none may crash
//! the application or leave a note partially mutated.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Authentication-tag mismatch on decrypt. The cipher cannot tell a
    /// wrong password apart from corrupted ciphertext, so neither can we.
    #[error("incorrect password or corrupted data")]
    Decryption,

    #[error("AI operation failed: {0}")]
    AiOperation(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// The note is encrypted and the requested operation would have to
    /// interpret its ciphertext as rich text.
    #[error("Note is encrypted: {0}")]
    NoteLocked(String),

    #[error("Cannot encrypt an empty note")]
    EmptyContent,

    #[error("{0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
