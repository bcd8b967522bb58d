//! Medication stock. Prices are kept as integer cents.

use super::table::{expect_row, overwrite, Table};
use super::{ensure_reference, Reference};
use crate::auth::Session;
use crate::error::AppResult;
use crate::models::Medication;
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::Date;

#[derive(Debug, Clone, Default)]
pub struct NewMedication {
    pub name: String,
    pub release_form: Option<String>,
    pub registry_form: Option<String>,
    pub quantity: Option<i64>,
    pub expiration_date: Option<Date>,
    /// Cents.
    pub price: Option<i64>,
    pub disease_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub release_form: Option<Option<String>>,
    pub registry_form: Option<Option<String>>,
    pub quantity: Option<Option<i64>>,
    pub expiration_date: Option<Option<Date>>,
    pub price: Option<Option<i64>>,
    pub disease_id: Option<Option<i64>>,
}

/// [`Table`] over `medications`, joined with the disease name.
pub struct Medications;

const SELECT: &str = "SELECT m.id_medication, m.name, m.release_form, m.registry_form, m.quantity,
            m.expiration_date, m.price_cents, m.disease_id, d.name
     FROM medications m
     LEFT JOIN diseases d ON d.id_disease = m.disease_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id_medication: row.get(0)?,
        name: row.get(1)?,
        release_form: row.get(2)?,
        registry_form: row.get(3)?,
        quantity: row.get(4)?,
        expiration_date: row.get(5)?,
        price: row.get(6)?,
        disease_id: row.get(7)?,
        disease_name: row.get(8)?,
    })
}

impl Table for Medications {
    type Row = Medication;
    type New = NewMedication;
    type Patch = MedicationPatch;

    const LABEL: &'static str = "Medication";

    fn list(conn: &Connection) -> AppResult<Vec<Medication>> {
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY m.id_medication"))?;
        let medications = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Medication>> {
        let medication = conn
            .query_row(&format!("{SELECT} WHERE m.id_medication = ?1"), params![id], from_row)
            .optional()?;
        Ok(medication)
    }

    fn insert(conn: &Connection, new: &NewMedication, _actor: &Session) -> AppResult<i64> {
        ensure_reference(conn, Reference::Disease, new.disease_id)?;
        conn.execute(
            "INSERT INTO medications (name, release_form, registry_form, quantity, expiration_date, price_cents, disease_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.name,
                new.release_form,
                new.registry_form,
                new.quantity,
                new.expiration_date,
                new.price,
                new.disease_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(conn: &Connection, id: i64, patch: &MedicationPatch, _actor: &Session) -> AppResult<()> {
        let mut current = Self::get(conn, id)?.ok_or_else(|| Self::not_found(id))?;
        overwrite(&mut current.name, &patch.name);
        overwrite(&mut current.release_form, &patch.release_form);
        overwrite(&mut current.registry_form, &patch.registry_form);
        overwrite(&mut current.quantity, &patch.quantity);
        overwrite(&mut current.expiration_date, &patch.expiration_date);
        overwrite(&mut current.price, &patch.price);
        overwrite(&mut current.disease_id, &patch.disease_id);
        ensure_reference(conn, Reference::Disease, current.disease_id)?;

        conn.execute(
            "UPDATE medications
             SET name = ?1, release_form = ?2, registry_form = ?3, quantity = ?4,
                 expiration_date = ?5, price_cents = ?6, disease_id = ?7
             WHERE id_medication = ?8",
            params![
                current.name,
                current.release_form,
                current.registry_form,
                current.quantity,
                current.expiration_date,
                current.price,
                current.disease_id,
                id,
            ],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, id: i64) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM medications WHERE id_medication = ?1",
            params![id],
        )?;
        expect_row::<Self>(affected, id)
    }
}
