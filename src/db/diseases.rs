//! Disease catalogue, each entry optionally tied to a department.

use super::table::{expect_row, overwrite, Table};
use super::{ensure_reference, Reference};
use crate::auth::Session;
use crate::error::AppResult;
use crate::models::Disease;
use rusqlite::{params, Connection, OptionalExtension, Row};

#[derive(Debug, Clone)]
pub struct NewDisease {
    pub code: String,
    pub name: String,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct DiseasePatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub department_id: Option<Option<i64>>,
}

pub struct Diseases;

const SELECT: &str = "SELECT d.id_disease, d.code, d.name, d.department_id, dep.department_name
     FROM diseases d
     LEFT JOIN departments dep ON dep.id_department = d.department_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Disease> {
    Ok(Disease {
        id_disease: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        department_id: row.get(3)?,
        department_name: row.get(4)?,
    })
}

impl Table for Diseases {
    type Row = Disease;
    type New = NewDisease;
    type Patch = DiseasePatch;

    const LABEL: &'static str = "Disease";

    fn list(conn: &Connection) -> AppResult<Vec<Disease>> {
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY d.id_disease"))?;
        let diseases = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(diseases)
    }

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Disease>> {
        let disease = conn
            .query_row(&format!("{SELECT} WHERE d.id_disease = ?1"), params![id], from_row)
            .optional()?;
        Ok(disease)
    }

    fn insert(conn: &Connection, new: &NewDisease, _actor: &Session) -> AppResult<i64> {
        ensure_reference(conn, Reference::Department, new.department_id)?;
        conn.execute(
            "INSERT INTO diseases (code, name, department_id) VALUES (?1, ?2, ?3)",
            params![new.code, new.name, new.department_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(conn: &Connection, id: i64, patch: &DiseasePatch, _actor: &Session) -> AppResult<()> {
        let mut current = Self::get(conn, id)?.ok_or_else(|| Self::not_found(id))?;
        overwrite(&mut current.code, &patch.code);
        overwrite(&mut current.name, &patch.name);
        overwrite(&mut current.department_id, &patch.department_id);
        ensure_reference(conn, Reference::Department, current.department_id)?;

        conn.execute(
            "UPDATE diseases SET code = ?1, name = ?2, department_id = ?3 WHERE id_disease = ?4",
            params![current.code, current.name, current.department_id, id],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, id: i64) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM diseases WHERE id_disease = ?1", params![id])?;
        expect_row::<Self>(affected, id)
    }
}
