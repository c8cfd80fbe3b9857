//! Note domain model and use-case payloads.
//!
//! # Responsibility
//! - Define the stored `Note` record and the `NoteView` read projection.
//! - Define request payloads whose field presence is validated by the service.
//!
//! # Invariants
//! - `id` is assigned once at creation and never changes.
//! - `title` is unique across all stored notes.
//! - `username` exists only on `NoteView`; it is never persisted with a note.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a stored note.
///
/// Generated as a random v4 UUID by `Note::new` before insert rather than by
/// SQLite; the store persists it unchanged and it never changes afterwards.
pub type NoteId = Uuid;

/// Stored note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Owner reference. Not verified against the user directory.
    pub user: UserId,
    pub title: String,
    pub text: String,
    pub completed: bool,
    /// Creation time in epoch milliseconds, maintained by the store.
    pub created_at: i64,
    /// Last update time in epoch milliseconds, maintained by the store.
    pub updated_at: i64,
}

impl Note {
    /// Creates an unsaved note with a fresh id and `completed = false`.
    ///
    /// Timestamps are zero until the store assigns them on insert.
    pub fn new(user: impl Into<UserId>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: user.into(),
            title: title.into(),
            text: text.into(),
            completed: false,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Note projection enriched with the owner's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub user: UserId,
    pub title: String,
    pub text: String,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    /// `None` when the owner id does not resolve to a user.
    pub username: Option<String>,
}

impl NoteView {
    pub fn from_note(note: Note, username: Option<String>) -> Self {
        Self {
            id: note.id,
            user: note.user,
            title: note.title,
            text: note.text,
            completed: note.completed,
            created_at: note.created_at,
            updated_at: note.updated_at,
            username,
        }
    }
}

/// Create payload. Missing or empty fields are rejected by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateNoteRequest {
    pub user: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Full-replacement update payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateNoteRequest {
    pub id: Option<String>,
    pub user: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    /// Kept as a raw value so non-boolean input (e.g. `"true"`) can be
    /// rejected as invalid input instead of failing deserialization.
    pub completed: Option<serde_json::Value>,
}

/// Delete payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteNoteRequest {
    pub id: Option<String>,
}

/// Acknowledgement body returned by mutating use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
