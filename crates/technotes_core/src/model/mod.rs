//! Domain model for notes and their owners.
//!
//! # Responsibility
//! - Define stored note records and the owner-enriched read projection.
//! - Define request/response shapes exchanged with service callers.
//!
//! # Invariants
//! - Every note is identified by a store-assigned `NoteId`.
//! - `Note::user` is a non-owning reference; owner existence is not enforced.

pub mod note;
pub mod user;
