//! Credential store: usernames, bcrypt hashes and roles.

use crate::error::AppResult;
use crate::models::{Role, User};
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "SELECT id, username, password_hash, role FROM users";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
    })
}

/// Inserts a new user. The password must already be hashed.
pub fn insert(conn: &Connection, username: &str, password_hash: &str, role: Role) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
        params![username, password_hash, role],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_username(conn: &Connection, username: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(&format!("{COLUMNS} WHERE username = ?1"), params![username], from_row)
        .optional()?;
    Ok(user)
}

pub fn get(conn: &Connection, user_id: i64) -> AppResult<Option<User>> {
    let user = conn
        .query_row(&format!("{COLUMNS} WHERE id = ?1"), params![user_id], from_row)
        .optional()?;
    Ok(user)
}

pub fn count(conn: &Connection) -> AppResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}
