//! Hospital departments.
//!
//! Diseases, employees and patients point at departments, so a department
//! can only be deleted once nothing references it.

use super::table::{expect_row, overwrite, Table};
use crate::auth::Session;
use crate::error::AppResult;
use crate::models::Department;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Input for `action=insert`.
#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub department_name: String,
    pub fio_doctor: Option<String>,
}

/// Input for `action=update`. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DepartmentPatch {
    pub department_name: Option<String>,
    pub fio_doctor: Option<Option<String>>,
}

pub struct Departments;

const SELECT: &str = "SELECT id_department, department_name, fio_doctor FROM departments";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        id_department: row.get(0)?,
        department_name: row.get(1)?,
        fio_doctor: row.get(2)?,
    })
}

impl Table for Departments {
    type Row = Department;
    type New = NewDepartment;
    type Patch = DepartmentPatch;

    const LABEL: &'static str = "Department";

    fn list(conn: &Connection) -> AppResult<Vec<Department>> {
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY id_department"))?;
        let departments = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(departments)
    }

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Department>> {
        let department = conn
            .query_row(&format!("{SELECT} WHERE id_department = ?1"), params![id], from_row)
            .optional()?;
        Ok(department)
    }

    fn insert(conn: &Connection, new: &NewDepartment, _actor: &Session) -> AppResult<i64> {
        conn.execute(
            "INSERT INTO departments (department_name, fio_doctor) VALUES (?1, ?2)",
            params![new.department_name, new.fio_doctor],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(conn: &Connection, id: i64, patch: &DepartmentPatch, _actor: &Session) -> AppResult<()> {
        let mut current = Self::get(conn, id)?.ok_or_else(|| Self::not_found(id))?;
        overwrite(&mut current.department_name, &patch.department_name);
        overwrite(&mut current.fio_doctor, &patch.fio_doctor);

        conn.execute(
            "UPDATE departments SET department_name = ?1, fio_doctor = ?2 WHERE id_department = ?3",
            params![current.department_name, current.fio_doctor, id],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, id: i64) -> AppResult<()> {
        let affected = conn.execute(
            "DELETE FROM departments WHERE id_department = ?1",
            params![id],
        )?;
        expect_row::<Self>(affected, id)
    }
}
