//! Note use-case service.
//!
//! # Responsibility
//! - Provide list/create/update/delete note APIs over injected repositories.
//! - Validate request presence/type before touching the store.
//! - Enforce global title uniqueness ahead of the storage-level backstop.
//! - Enrich listed notes with the owner's username via one batched lookup.
//!
//! # Invariants
//! - Validation, existence and uniqueness checks all precede any mutation.
//! - `update` is a full replacement of `user`, `title`, `text`, `completed`.
//! - A note keeping its own title never conflicts with itself.
//! - Owner existence is not verified on create or update.
//! - Listing an empty collection is reported as `NotFound`.

use crate::model::note::{
    CreateNoteRequest, DeleteNoteRequest, MessageResponse, Note, NoteId, NoteView,
    UpdateNoteRequest,
};
use crate::model::user::UserId;
use crate::repo::note_repo::NoteRepository;
use crate::repo::user_repo::UserDirectory;
use crate::repo::RepoError;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MSG_NO_NOTES: &str = "No notes found";
/// Reported for any missing, empty or wrong-typed request field.
pub const MSG_ALL_FIELDS_REQUIRED: &str = "All fields required";
const MSG_DUPLICATE_TITLE: &str = "Duplicate note title";
const MSG_NOTE_NOT_FOUND: &str = "Note not found";
/// Reported when a delete request carries no usable id.
pub const MSG_NOTE_ID_REQUIRED: &str = "Note ID required";
const MSG_INVALID_NOTE_DATA: &str = "Invalid note data";
const MSG_CREATED: &str = "Note created successfully";
const MSG_UPDATED: &str = "Note updated successfully";
const MSG_DELETED: &str = "Note deleted successfully";

/// Caller-facing outcome category, mappable to any transport's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    Created,
    InvalidInput,
    Conflict,
    NotFound,
    InvalidData,
}

impl ResponseStatus {
    /// HTTP status code for this category.
    ///
    /// `NotFound` maps to 400 and `InvalidData` to 409, matching the
    /// established client contract.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::Created => 201,
            Self::InvalidInput | Self::NotFound => 400,
            Self::Conflict | Self::InvalidData => 409,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Created)
    }
}

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Request fields are missing, empty or of the wrong type.
    InvalidInput(&'static str),
    /// Another note already owns the requested title.
    Conflict(String),
    /// Referenced note does not exist, or the collection is empty on list.
    NotFound(&'static str),
    /// Store rejected a write.
    InvalidData(String),
    /// Store failed while reading.
    Repo(RepoError),
}

impl NoteServiceError {
    /// Classifies this error into a response category.
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::InvalidInput(_) => ResponseStatus::InvalidInput,
            Self::Conflict(_) => ResponseStatus::Conflict,
            Self::NotFound(_) => ResponseStatus::NotFound,
            Self::InvalidData(_) | Self::Repo(_) => ResponseStatus::InvalidData,
        }
    }

    /// Caller-facing message body.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(message) | Self::NotFound(message) => (*message).to_string(),
            Self::Conflict(_) => MSG_DUPLICATE_TITLE.to_string(),
            Self::InvalidData(_) | Self::Repo(_) => MSG_INVALID_NOTE_DATA.to_string(),
        }
    }

    /// Converts this error into an acknowledgement body.
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse::new(self.message())
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Conflict(title) => write!(f, "duplicate note title: `{title}`"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::InvalidData(details) => write!(f, "invalid note data: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over a notes store and an owner directory.
pub struct NoteService<N: NoteRepository, U: UserDirectory> {
    notes: N,
    users: U,
}

impl<N: NoteRepository, U: UserDirectory> NoteService<N, U> {
    /// Creates a service using the provided repository implementations.
    pub fn new(notes: N, users: U) -> Self {
        Self { notes, users }
    }

    /// Lists every note enriched with its owner's username.
    ///
    /// Owners are resolved with one batched lookup over the distinct `user`
    /// ids. Notes whose owner does not resolve are returned with
    /// `username = None`.
    ///
    /// # Errors
    /// - `NotFound` when no notes are stored.
    pub fn list(&self) -> NoteServiceResult<Vec<NoteView>> {
        let notes = self.notes.find_all()?;
        if notes.is_empty() {
            debug!("event=note_list module=service status=empty");
            return Err(NoteServiceError::NotFound(MSG_NO_NOTES));
        }

        let owner_ids = notes
            .iter()
            .map(|note| note.user.clone())
            .collect::<BTreeSet<UserId>>();
        let usernames = self.users.usernames_by_ids(&owner_ids)?;

        let unresolved = owner_ids
            .iter()
            .filter(|id| !usernames.contains_key(*id))
            .count();
        if unresolved > 0 {
            warn!(
                "event=note_list module=service status=ok unresolved_owners={unresolved}"
            );
        }

        let views = notes
            .into_iter()
            .map(|note| {
                let username = usernames.get(&note.user).cloned();
                NoteView::from_note(note, username)
            })
            .collect::<Vec<_>>();

        info!(
            "event=note_list module=service status=ok count={} owners={}",
            views.len(),
            owner_ids.len()
        );
        Ok(views)
    }

    /// Gets one note by id, enriched with its owner's username.
    pub fn get(&self, id: &str) -> NoteServiceResult<NoteView> {
        let note = self.require_note(id)?;
        let username = self.users.find_user(&note.user)?.map(|user| user.username);
        Ok(NoteView::from_note(note, username))
    }

    /// Creates a note with `completed = false`.
    ///
    /// # Errors
    /// - `InvalidInput` when `user`, `title` or `text` is missing or empty.
    /// - `Conflict` when any stored note already has this title.
    /// - `InvalidData` when the store rejects the insert.
    pub fn create(&self, request: &CreateNoteRequest) -> NoteServiceResult<MessageResponse> {
        let (Some(user), Some(title), Some(text)) = (
            present(&request.user),
            present(&request.title),
            present(&request.text),
        ) else {
            return Err(NoteServiceError::InvalidInput(MSG_ALL_FIELDS_REQUIRED));
        };

        self.ensure_title_available(title, None)?;

        let note = Note::new(user, title, text);
        let note_id = self.notes.insert(&note).map_err(|err| {
            warn!("event=note_create module=service status=error error={err}");
            NoteServiceError::InvalidData(err.to_string())
        })?;

        info!("event=note_create module=service status=ok note_id={note_id}");
        Ok(MessageResponse::new(MSG_CREATED))
    }

    /// Replaces all mutable fields of an existing note.
    ///
    /// # Errors
    /// - `InvalidInput` when `id`, `user`, `title` or `text` is missing or
    ///   empty, or `completed` is not a boolean.
    /// - `NotFound` when no note has this id.
    /// - `Conflict` when a different note already has the target title.
    /// - `InvalidData` when the store rejects the save.
    pub fn update(&self, request: &UpdateNoteRequest) -> NoteServiceResult<MessageResponse> {
        let (Some(id), Some(user), Some(title), Some(text), Some(completed)) = (
            present(&request.id),
            present(&request.user),
            present(&request.title),
            present(&request.text),
            request.completed.as_ref().and_then(|value| value.as_bool()),
        ) else {
            return Err(NoteServiceError::InvalidInput(MSG_ALL_FIELDS_REQUIRED));
        };

        let mut note = self.require_note(id)?;
        self.ensure_title_available(title, Some(note.id))?;

        note.user = UserId::new(user);
        note.title = title.to_string();
        note.text = text.to_string();
        note.completed = completed;

        self.notes.save(&note).map_err(|err| {
            warn!(
                "event=note_update module=service status=error note_id={} error={err}",
                note.id
            );
            NoteServiceError::InvalidData(err.to_string())
        })?;

        info!(
            "event=note_update module=service status=ok note_id={} completed={completed}",
            note.id
        );
        Ok(MessageResponse::new(MSG_UPDATED))
    }

    /// Deletes one note by id.
    ///
    /// Once existence is confirmed the store reporting "nothing removed" is
    /// the only remaining failure; it surfaces as `InvalidData`.
    pub fn delete(&self, request: &DeleteNoteRequest) -> NoteServiceResult<MessageResponse> {
        let Some(id) = present(&request.id) else {
            return Err(NoteServiceError::InvalidInput(MSG_NOTE_ID_REQUIRED));
        };

        let note = self.require_note(id)?;
        let removed = self.notes.delete_by_id(note.id).map_err(|err| {
            warn!(
                "event=note_delete module=service status=error note_id={} error={err}",
                note.id
            );
            NoteServiceError::InvalidData(err.to_string())
        })?;
        if !removed {
            warn!(
                "event=note_delete module=service status=error note_id={} error_code=nothing_removed",
                note.id
            );
            return Err(NoteServiceError::InvalidData(format!(
                "note {} was not removed",
                note.id
            )));
        }

        info!(
            "event=note_delete module=service status=ok note_id={}",
            note.id
        );
        Ok(MessageResponse::new(MSG_DELETED))
    }

    fn require_note(&self, id: &str) -> NoteServiceResult<Note> {
        // Ids are opaque to callers: anything that is not a stored id is
        // simply not found.
        let Ok(note_id) = Uuid::parse_str(id) else {
            return Err(NoteServiceError::NotFound(MSG_NOTE_NOT_FOUND));
        };
        self.notes
            .find_by_id(note_id)?
            .ok_or(NoteServiceError::NotFound(MSG_NOTE_NOT_FOUND))
    }

    fn ensure_title_available(&self, title: &str, owner: Option<NoteId>) -> NoteServiceResult<()> {
        match self.notes.find_by_title(title)? {
            Some(existing) if Some(existing.id) != owner => {
                debug!(
                    "event=note_title_conflict module=service status=error existing_id={}",
                    existing.id
                );
                Err(NoteServiceError::Conflict(title.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Returns the field value when present and non-empty.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
