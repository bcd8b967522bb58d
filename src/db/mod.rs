//! Database module for the hospital records service.
//!
//! [`Database`] owns the single SQLite connection. Reads go through
//! [`Database::read`]; every write goes through [`Database::write`], which wraps
//! the closure in one transaction that is committed only if the closure
//! succeeds. Per-entity queries live in the submodules, each implementing
//! [`Table`].

use crate::error::{AppError, AppResult};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

pub mod departments;
pub mod diseases;
pub mod editors;
pub mod employees;
pub mod medications;
pub mod patients;
pub mod table;
pub mod users;

pub use table::{Change, Command, Table};

/// Shared handle to the application database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file at `path` and applies the schema.
    ///
    /// The special path `:memory:` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Storage`] if the file cannot be opened or the
    /// schema cannot be executed.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        // Execute the schema to create the tables
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Storage("database connection lock poisoned".to_string()))
    }

    /// Runs a read-only closure against the connection.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs `f` inside one transaction. An error from `f` drops the
    /// transaction, which rolls back everything `f` wrote.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> AppResult<T>) -> AppResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Creates the bootstrap superuser if no account with that name exists yet.
    ///
    /// # Arguments
    ///
    /// * `username` - The account name, already trimmed.
    /// * `password_hash` - A bcrypt hash of the password.
    ///
    /// Returns `true` when the account was created.
    pub fn ensure_superuser(&self, username: &str, password_hash: &str) -> AppResult<bool> {
        self.write(|tx| {
            let mut stmt = tx.prepare("SELECT COUNT(*) FROM users WHERE username = ?1")?;
            let count: i64 = stmt.query_row(params![username], |row| row.get(0))?;
            if count > 0 {
                return Ok(false);
            }
            users::insert(tx, username, password_hash, crate::models::Role::Superuser)?;
            info!(%username, "created bootstrap superuser");
            Ok(true)
        })
    }
}

/// A foreign key target that form input may point at.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Reference {
    Department,
    Disease,
}

impl Reference {
    fn exists_sql(&self) -> &'static str {
        match self {
            Reference::Department => {
                "SELECT EXISTS(SELECT 1 FROM departments WHERE id_department = ?1)"
            }
            Reference::Disease => "SELECT EXISTS(SELECT 1 FROM diseases WHERE id_disease = ?1)",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Reference::Department => "Department",
            Reference::Disease => "Disease",
        }
    }
}

/// Fails with [`AppError::Referential`] when `id` is set but names no row.
pub(crate) fn ensure_reference(conn: &Connection, target: Reference, id: Option<i64>) -> AppResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    let exists: bool = conn.query_row(target.exists_sql(), params![id], |row| row.get(0))?;
    if exists {
        Ok(())
    } else {
        Err(AppError::Referential(format!(
            "{} {} does not exist",
            target.label(),
            id
        )))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::db;
    use super::*;

    #[test]
    fn failed_writes_leave_no_rows_behind() {
        let db = db();
        let result: AppResult<()> = db.write(|tx| {
            tx.execute(
                "INSERT INTO departments (department_name) VALUES (?1)",
                params!["Ghost"],
            )?;
            Err(AppError::validation("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM departments", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = db();
        let err = db
            .write(|tx| {
                tx.execute(
                    "INSERT INTO employees (fio, department_id) VALUES (?1, ?2)",
                    params!["Nobody", 99],
                )?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Referential(_)));
    }

    #[test]
    fn ensure_reference_accepts_null_and_existing_ids() {
        let db = db();
        db.read(|conn| {
            conn.execute(
                "INSERT INTO departments (department_name) VALUES ('Surgery')",
                [],
            )?;
            ensure_reference(conn, Reference::Department, None)?;
            ensure_reference(conn, Reference::Department, Some(conn.last_insert_rowid()))?;
            Ok(())
        })
        .unwrap();

        let err = db
            .read(|conn| ensure_reference(conn, Reference::Disease, Some(5)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Disease 5 does not exist");
    }

    #[test]
    fn bootstrap_superuser_is_created_once() {
        let db = db();
        assert!(db.ensure_superuser("root", "hash").unwrap());
        assert!(!db.ensure_superuser("root", "hash").unwrap());
        let user = db.read(|conn| users::find_by_username(conn, "root")).unwrap().unwrap();
        assert_eq!(user.role, crate::models::Role::Superuser);
    }
}
