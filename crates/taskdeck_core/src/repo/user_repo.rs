//! User directory contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve share targets and notification recipients by id or email.
//! - Provide the minimal registration surface the core needs for seeding.
//!
//! # Invariants
//! - `username` is unique; `email` is not, and may be blank.
//! - Email resolution is deterministic: first matching row in insertion
//!   order.

use crate::model::user::{User, UserId};
use crate::repo::task_repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT uuid, username, email FROM users";

/// Directory interface for user lookup and registration.
pub trait UserDirectory {
    /// Registers a user and returns the stored record.
    fn create_user(&self, username: &str, email: &str) -> RepoResult<User>;
    /// Gets one user by stable id.
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Gets the first user whose email matches exactly.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user directory.
pub struct SqliteUserDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDirectory<'conn> {
    /// Constructs a directory from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserDirectory for SqliteUserDirectory<'_> {
    fn create_user(&self, username: &str, email: &str) -> RepoResult<User> {
        let id: UserId = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO users (uuid, username, email) VALUES (?1, ?2, ?3);",
            params![id.to_string(), username, email],
        )?;

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE email = ?1 ORDER BY rowid ASC LIMIT 1;"
        ))?;

        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in users.uuid"))
    })?;

    Ok(User {
        id,
        username: row.get("username")?,
        email: row.get("email")?,
    })
}
