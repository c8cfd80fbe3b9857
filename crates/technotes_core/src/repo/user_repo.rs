//! Owner lookup contract and SQLite implementation.
//!
//! # Responsibility
//! - Resolve owner display names for note projections in one batched query.
//! - Allow the account subsystem (and tests) to seed owner records.
//!
//! # Invariants
//! - Batch lookups never issue more than one query per
//!   `USERNAME_LOOKUP_CHUNK` ids.
//! - Ids that do not resolve are absent from the returned map.

use crate::model::user::{User, UserId};
use crate::repo::{ensure_table_exists, RepoResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};

/// Stays well under SQLite's default bind-parameter limit.
const USERNAME_LOOKUP_CHUNK: usize = 500;

/// Read access to owner accounts.
pub trait UserDirectory {
    fn find_user(&self, id: &UserId) -> RepoResult<Option<User>>;
    /// Resolves display names for a set of ids.
    fn usernames_by_ids(&self, ids: &BTreeSet<UserId>) -> RepoResult<HashMap<UserId, String>>;
}

/// SQLite-backed owner directory.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    /// Constructs a directory from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_exists(conn, "users")?;
        Ok(Self { conn })
    }

    /// Inserts one owner record.
    pub fn insert_user(&self, user: &User) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (id, username) VALUES (?1, ?2);",
            params![user.id.as_str(), user.username.as_str()],
        )?;
        Ok(())
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn find_user(&self, id: &UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username FROM users WHERE id = ?1;",
                [id.as_str()],
                |row| {
                    Ok(User {
                        id: UserId::new(row.get::<_, String>(0)?),
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn usernames_by_ids(&self, ids: &BTreeSet<UserId>) -> RepoResult<HashMap<UserId, String>> {
        let ids = ids.iter().collect::<Vec<_>>();
        let mut resolved = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(USERNAME_LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = self.conn.prepare(&format!(
                "SELECT id, username FROM users WHERE id IN ({placeholders});"
            ))?;
            let mut rows = stmt.query(params_from_iter(chunk.iter().map(|id| id.as_str())))?;
            while let Some(row) = rows.next()? {
                let id: String = row.get(0)?;
                resolved.insert(UserId::new(id), row.get(1)?);
            }
        }

        Ok(resolved)
    }
}
