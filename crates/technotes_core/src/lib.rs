//! Core domain logic for TechNotes.
//! This crate is the single source of truth for note lifecycle invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{
    CreateNoteRequest, DeleteNoteRequest, MessageResponse, Note, NoteId, NoteView,
    UpdateNoteRequest,
};
pub use model::user::{User, UserId};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::user_repo::{SqliteUserDirectory, UserDirectory};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{
    NoteService, NoteServiceError, NoteServiceResult, ResponseStatus,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
