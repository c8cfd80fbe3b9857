//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide find/insert/save/delete primitives over the `notes` table.
//! - Translate unique-index failures on `title` into `DuplicateTitle`.
//!
//! # Invariants
//! - `find_all` returns rows in insertion order.
//! - `save` replaces `user`, `title`, `text`, `completed` and bumps
//!   `updated_at`; `id` and `created_at` are never rewritten.

use crate::model::note::{Note, NoteId};
use crate::model::user::UserId;
use crate::repo::{ensure_table_exists, RepoError, RepoResult};
use rusqlite::{ffi, params, Connection, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    text,
    completed,
    created_at,
    updated_at
FROM notes";

/// Store capabilities required by note use-cases.
pub trait NoteRepository {
    fn find_all(&self) -> RepoResult<Vec<Note>>;
    fn find_by_id(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Exact, case-sensitive title match.
    fn find_by_title(&self, title: &str) -> RepoResult<Option<Note>>;
    /// Inserts a new note and returns its id.
    fn insert(&self, note: &Note) -> RepoResult<NoteId>;
    /// Persists all mutable fields of an existing note.
    fn save(&self, note: &Note) -> RepoResult<()>;
    /// Deletes one note. Returns `false` when no row was removed.
    fn delete_by_id(&self, id: NoteId) -> RepoResult<bool>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_exists(conn, "notes")?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn find_by_id(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_title(&self, title: &str) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE title = ?1 LIMIT 1;"))?;
        let mut rows = stmt.query([title])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_note_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, note: &Note) -> RepoResult<NoteId> {
        self.conn
            .execute(
                "INSERT INTO notes (id, user_id, title, text, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    note.id.to_string(),
                    note.user.as_str(),
                    note.title.as_str(),
                    note.text.as_str(),
                    note.completed,
                ],
            )
            .map_err(|err| classify_write_error(err, note.title.as_str()))?;
        Ok(note.id)
    }

    fn save(&self, note: &Note) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE notes
                 SET
                    user_id = ?2,
                    title = ?3,
                    text = ?4,
                    completed = ?5,
                    updated_at = CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)
                 WHERE id = ?1;",
                params![
                    note.id.to_string(),
                    note.user.as_str(),
                    note.title.as_str(),
                    note.text.as_str(),
                    note.completed,
                ],
            )
            .map_err(|err| classify_write_error(err, note.title.as_str()))?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.id));
        }
        Ok(())
    }

    fn delete_by_id(&self, id: NoteId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

impl SqliteNoteRepository<'_> {
    /// Counts stored notes. Not part of `NoteRepository`; hosts use it for
    /// diagnostics and tests use it to assert the store is unchanged.
    pub fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative note count `{count}`")))
    }
}

fn classify_write_error(err: rusqlite::Error, title: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateTitle(title.to_string())
        }
        _ => err.into(),
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notes.id")))?;

    let completed = match row.get::<_, i64>("completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid completed value `{other}` in notes.completed"
            )));
        }
    };

    Ok(Note {
        id,
        user: UserId::new(row.get::<_, String>("user_id")?),
        title: row.get("title")?,
        text: row.get("text")?,
        completed,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
