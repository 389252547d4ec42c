//! Note models
//!
//! Field names serialize in camelCase to stay byte-compatible with the
//! persisted JSON blob format (`isEncrypted`, `createdAt`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

/// A note with rich text content.
///
/// `is_encrypted` is the single source of truth for how `content` is
/// interpreted: `false` means an HTML-ish rich-text document, `true`
/// means an opaque base64 ciphertext blob that no consumer may parse,
/// search, render, or send to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub is_encrypted: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Prior snapshots, newest first, capped at
    /// [`config::MAX_VERSIONS_PER_NOTE`].
    #[serde(default)]
    pub versions: Vec<NoteVersion>,
}

/// A point-in-time snapshot of a note's user-visible fields.
///
/// Snapshots are only taken from plaintext states, so `content` here is
/// always rich text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteVersion {
    pub version_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update request; `None` fields are left untouched.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
}

impl Note {
    /// Create a note with default title and placeholder content.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: config::DEFAULT_NOTE_TITLE.to_string(),
            content: config::DEFAULT_NOTE_CONTENT.to_string(),
            is_encrypted: false,
            is_pinned: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
        }
    }

    /// True when the note still holds the creation placeholder or
    /// extracts to no text at all. Empty notes cannot be encrypted.
    pub fn is_empty(&self) -> bool {
        !self.is_encrypted
            && (self.content.is_empty()
                || self.content == config::DEFAULT_NOTE_CONTENT
                || crate::richtext::strip_tags(&self.content).is_empty())
    }

    /// Snapshot the current user-visible fields as a version record.
    pub fn snapshot(&self) -> NoteVersion {
        NoteVersion {
            version_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}
