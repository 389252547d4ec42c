//! QuillVault core
//!
//! The note-taking core behind the editor UI: note CRUD with version
//! history, client-side AES encryption of note bodies, the encryption
//! state machine gating plaintext/ciphertext transitions, AI-assisted
//! text operations and translation via pluggable providers, export
//! payload generation, and JSON persistence.
//!
//! The one invariant everything here defends: content of an encrypted
//! note is opaque. It is never rendered, edited, searched, exported, or
//! sent to a provider.

pub mod config;
pub mod crypto;
pub mod error;
pub mod export;
pub mod richtext;
pub mod services;
pub mod storage;
pub mod store;
