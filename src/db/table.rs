//! The one data-access interface every resource goes through.

use super::Database;
use crate::auth::Session;
use crate::error::{AppError, AppResult};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

/// List/insert/update/delete for one entity.
///
/// Implementations only talk SQL; [`Database::apply`] supplies the
/// transaction and callers check access before getting here. Rows and
/// inputs must be `Send` to move onto the blocking pool.
pub trait Table: 'static {
    /// Row as shown on the list page, joined with referenced names.
    type Row: Serialize + Send + 'static;
    /// Validated input for a new row.
    type New: Send + 'static;
    /// Validated input for an update. Absent fields keep their value.
    type Patch: Send + 'static;

    /// Singular name used in messages, e.g. `"Department"`.
    const LABEL: &'static str;

    fn list(conn: &Connection) -> AppResult<Vec<Self::Row>>;

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Self::Row>>;

    /// Writes one row and returns its generated id.
    fn insert(conn: &Connection, new: &Self::New, actor: &Session) -> AppResult<i64>;

    /// Overwrites the fields set in `patch`; [`AppError::NotFound`] if `id` is missing.
    fn update(conn: &Connection, id: i64, patch: &Self::Patch, actor: &Session) -> AppResult<()>;

    /// Removes exactly the row `id`; [`AppError::NotFound`] if it is missing.
    fn delete(conn: &Connection, id: i64) -> AppResult<()>;

    fn not_found(id: i64) -> AppError {
        AppError::NotFound(format!("{} {}", Self::LABEL, id))
    }
}

/// A decoded form submission against a [`Table`].
pub enum Command<T: Table> {
    Insert(T::New),
    Update(i64, T::Patch),
    Delete(i64),
}

/// What a successful [`Command`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Inserted(i64),
    Updated(i64),
    Deleted(i64),
}

impl Change {
    pub fn describe(&self, label: &str) -> String {
        match self {
            Change::Inserted(id) => format!("{label} {id} created"),
            Change::Updated(id) => format!("{label} {id} updated"),
            Change::Deleted(id) => format!("{label} {id} deleted"),
        }
    }
}

impl Database {
    pub fn list<T: Table>(&self) -> AppResult<Vec<T::Row>> {
        self.read(T::list)
    }

    pub fn get<T: Table>(&self, id: i64) -> AppResult<T::Row> {
        self.read(|conn| T::get(conn, id))?
            .ok_or_else(|| T::not_found(id))
    }

    /// Runs `command` in its own transaction.
    pub fn apply<T: Table>(&self, command: Command<T>, actor: &Session) -> AppResult<Change> {
        let change = self.write(|tx| match &command {
            Command::Insert(new) => T::insert(tx, new, actor).map(Change::Inserted),
            Command::Update(id, patch) => T::update(tx, *id, patch, actor).map(|()| Change::Updated(*id)),
            Command::Delete(id) => T::delete(tx, *id).map(|()| Change::Deleted(*id)),
        })?;
        info!(table = T::LABEL, user = %actor.username, ?change, "record changed");
        Ok(change)
    }
}

/// Replaces `field` when the patch carries a value for it.
pub(crate) fn overwrite<V: Clone>(field: &mut V, patch: &Option<V>) {
    if let Some(value) = patch {
        *field = value.clone();
    }
}

/// Fails with `T::not_found` when a statement touched no rows.
pub(crate) fn expect_row<T: Table>(affected: usize, id: i64) -> AppResult<()> {
    if affected == 0 {
        Err(T::not_found(id))
    } else {
        Ok(())
    }
}
