//! Patient records. Every write stamps the acting user as the editor.

use super::table::{expect_row, overwrite, Table};
use super::{editors, ensure_reference, Reference};
use crate::auth::Session;
use crate::error::AppResult;
use crate::models::Patient;
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::Date;

#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub fio: String,
    pub birthdate: Option<Date>,
    pub disease_id: Option<i64>,
    pub department_id: Option<i64>,
}

/// Also used by the personal-data form, which only sets `fio` and `birthdate`.
#[derive(Debug, Clone, Default)]
pub struct PatientPatch {
    pub fio: Option<String>,
    pub birthdate: Option<Option<Date>>,
    pub disease_id: Option<Option<i64>>,
    pub department_id: Option<Option<i64>>,
}

pub struct Patients;

const SELECT: &str = "SELECT p.id_patient, p.fio, p.birthdate, p.disease_id, d.name,
            p.department_id, dep.department_name, p.editor_id, ed.fio
     FROM patients p
     LEFT JOIN diseases d ON d.id_disease = p.disease_id
     LEFT JOIN departments dep ON dep.id_department = p.department_id
     LEFT JOIN editors ed ON ed.id_editor = p.editor_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id_patient: row.get(0)?,
        fio: row.get(1)?,
        birthdate: row.get(2)?,
        disease_id: row.get(3)?,
        disease_name: row.get(4)?,
        department_id: row.get(5)?,
        department_name: row.get(6)?,
        editor_id: row.get(7)?,
        editor_fio: row.get(8)?,
    })
}

impl Table for Patients {
    type Row = Patient;
    type New = NewPatient;
    type Patch = PatientPatch;

    const LABEL: &'static str = "Patient";

    fn list(conn: &Connection) -> AppResult<Vec<Patient>> {
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY p.id_patient"))?;
        let patients = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patients)
    }

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Patient>> {
        let patient = conn
            .query_row(&format!("{SELECT} WHERE p.id_patient = ?1"), params![id], from_row)
            .optional()?;
        Ok(patient)
    }

    fn insert(conn: &Connection, new: &NewPatient, actor: &Session) -> AppResult<i64> {
        ensure_reference(conn, Reference::Disease, new.disease_id)?;
        ensure_reference(conn, Reference::Department, new.department_id)?;
        let editor_id = editors::resolve(conn, actor)?;

        conn.execute(
            "INSERT INTO patients (fio, birthdate, disease_id, department_id, editor_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.fio,
                new.birthdate,
                new.disease_id,
                new.department_id,
                editor_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(conn: &Connection, id: i64, patch: &PatientPatch, actor: &Session) -> AppResult<()> {
        let mut current = Self::get(conn, id)?.ok_or_else(|| Self::not_found(id))?;
        overwrite(&mut current.fio, &patch.fio);
        overwrite(&mut current.birthdate, &patch.birthdate);
        overwrite(&mut current.disease_id, &patch.disease_id);
        overwrite(&mut current.department_id, &patch.department_id);
        ensure_reference(conn, Reference::Disease, current.disease_id)?;
        ensure_reference(conn, Reference::Department, current.department_id)?;
        let editor_id = editors::resolve(conn, actor)?;

        conn.execute(
            "UPDATE patients
             SET fio = ?1, birthdate = ?2, disease_id = ?3, department_id = ?4, editor_id = ?5
             WHERE id_patient = ?6",
            params![
                current.fio,
                current.birthdate,
                current.disease_id,
                current.department_id,
                editor_id,
                id,
            ],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, id: i64) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM patients WHERE id_patient = ?1", params![id])?;
        expect_row::<Self>(affected, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{db, session};
    use crate::db::{Change, Command};
    use crate::error::AppError;
    use crate::models::Role;
    use time::macros::date;

    fn admit(db: &crate::db::Database, actor: &Session, fio: &str) -> i64 {
        let command = Command::Insert(NewPatient {
            fio: fio.into(),
            birthdate: Some(date!(1985 - 06 - 01)),
            ..NewPatient::default()
        });
        match db.apply::<Patients>(command, actor).unwrap() {
            Change::Inserted(id) => id,
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn insert_records_the_acting_editor() {
        let db = db();
        let admin = session(&db, "greta", Role::Administrator);
        let id = admit(&db, &admin, "Anna Karenina");

        let row = db.get::<Patients>(id).unwrap();
        assert_eq!(row.editor_fio.as_deref(), Some("greta"));
        assert!(row.editor_id.is_some());
    }

    #[test]
    fn update_moves_the_editor_to_the_latest_user() {
        let db = db();
        let admin = session(&db, "greta", Role::Administrator);
        let root = session(&db, "root", Role::Superuser);
        let id = admit(&db, &admin, "Anna Karenina");

        let patch = PatientPatch {
            fio: Some("Anna Arkadyevna Karenina".into()),
            ..PatientPatch::default()
        };
        db.apply::<Patients>(Command::Update(id, patch), &root).unwrap();

        let row = db.get::<Patients>(id).unwrap();
        assert_eq!(row.fio, "Anna Arkadyevna Karenina");
        assert_eq!(row.birthdate, Some(date!(1985 - 06 - 01)));
        assert_eq!(row.editor_fio.as_deref(), Some("root"));
    }

    #[test]
    fn failed_update_does_not_touch_the_editor() {
        let db = db();
        let admin = session(&db, "greta", Role::Administrator);
        let root = session(&db, "root", Role::Superuser);
        let id = admit(&db, &admin, "Pierre Bezukhov");

        let patch = PatientPatch {
            disease_id: Some(Some(12)),
            ..PatientPatch::default()
        };
        let err = db.apply::<Patients>(Command::Update(id, patch), &root).unwrap_err();
        assert!(matches!(err, AppError::Referential(_)));

        let row = db.get::<Patients>(id).unwrap();
        assert_eq!(row.editor_fio.as_deref(), Some("greta"));
        assert_eq!(row.disease_id, None);
        let editors: i64 = db
            .read(|c| Ok(c.query_row("SELECT COUNT(*) FROM editors", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(editors, 1);
    }

    #[test]
    fn delete_missing_patient_is_not_found() {
        let db = db();
        let admin = session(&db, "greta", Role::Administrator);
        let err = db.apply::<Patients>(Command::Delete(9), &admin).unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "Patient 9"));
    }
}
