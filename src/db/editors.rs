//! Staff members recorded as the last editor of a patient record.

use crate::auth::Session;
use crate::error::AppResult;
use rusqlite::{params, Connection};

/// Returns the editor row for the acting user, creating it on first use.
///
/// The name and position are refreshed from the session each time.
pub fn resolve(conn: &Connection, actor: &Session) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO editors (user_id, fio, position) VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id) DO UPDATE SET fio = excluded.fio, position = excluded.position",
        params![actor.user_id, actor.username, actor.role],
    )?;
    let id = conn.query_row(
        "SELECT id_editor FROM editors WHERE user_id = ?1",
        params![actor.user_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{db, session};
    use crate::models::Role;

    #[test]
    fn one_editor_per_user() {
        let db = db();
        let admin = session(&db, "greta", Role::Administrator);
        let first = db.write(|tx| resolve(tx, &admin)).unwrap();
        let second = db.write(|tx| resolve(tx, &admin)).unwrap();
        assert_eq!(first, second);

        let (user_id, fio, position): (i64, String, String) = db
            .read(|c| {
                Ok(c.query_row(
                    "SELECT user_id, fio, position FROM editors WHERE id_editor = ?1",
                    params![first],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?)
            })
            .unwrap();
        assert_eq!(user_id, admin.user_id);
        assert_eq!(fio, "greta");
        assert_eq!(position, "administrator");
    }

    #[test]
    fn different_users_get_different_editors() {
        let db = db();
        let a = session(&db, "a", Role::Administrator);
        let b = session(&db, "b", Role::Superuser);
        let ea = db.write(|tx| resolve(tx, &a)).unwrap();
        let eb = db.write(|tx| resolve(tx, &b)).unwrap();
        assert_ne!(ea, eb);
    }
}
