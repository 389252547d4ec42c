//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the core.

// ===== Note Defaults =====

/// Title assigned to a freshly created note. A note still carrying this
/// title gets its title auto-derived from content on the next edit.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Note";

/// Placeholder content of a freshly created note (an empty rich-text
/// paragraph). Notes whose content equals this are treated as empty.
pub const DEFAULT_NOTE_CONTENT: &str = "<p><br></p>";

/// Maximum length of a title derived from note content, in characters.
/// Longer first lines are truncated with an ellipsis.
pub const MAX_DERIVED_TITLE_LEN: usize = 40;

// ===== Version History Limits =====

/// Maximum number of version snapshots retained per note.
/// When exceeded, the oldest snapshot is dropped first.
pub const MAX_VERSIONS_PER_NOTE: usize = 20;

// ===== AI / Translation Limits =====

/// Upper bound on a single AI or translation provider call in seconds.
/// Exceeding it is a failure, not a hang; the in-flight request is
/// dropped and any late response discarded.
pub const AI_TIMEOUT_SECS: u64 = 15;

// ===== Persistence =====

/// Fixed file name the note list is persisted under. The whole store
/// is one JSON document at this key.
pub const STORAGE_FILE_NAME: &str = "quillvault-notes.json";

/// Current persistence schema version. Documents without a version
/// field are legacy (version 0) bare arrays and are still accepted.
pub const SCHEMA_VERSION: u32 = 1;
