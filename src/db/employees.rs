//! Staff records shown on the employees page.

use super::table::{expect_row, overwrite, Table};
use super::{ensure_reference, Reference};
use crate::auth::Session;
use crate::error::AppResult;
use crate::models::Employee;
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::Date;

#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub fio: String,
    pub position: Option<String>,
    pub birthdate: Option<Date>,
    pub phnumber: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeePatch {
    pub fio: Option<String>,
    pub position: Option<Option<String>>,
    pub birthdate: Option<Option<Date>>,
    pub phnumber: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub department_id: Option<Option<i64>>,
}

pub struct Employees;

const SELECT: &str = "SELECT e.id_employee, e.fio, e.position, e.birthdate, e.phnumber, e.email,
            e.department_id, dep.department_name
     FROM employees e
     LEFT JOIN departments dep ON dep.id_department = e.department_id";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id_employee: row.get(0)?,
        fio: row.get(1)?,
        position: row.get(2)?,
        birthdate: row.get(3)?,
        phnumber: row.get(4)?,
        email: row.get(5)?,
        department_id: row.get(6)?,
        department_name: row.get(7)?,
    })
}

impl Table for Employees {
    type Row = Employee;
    type New = NewEmployee;
    type Patch = EmployeePatch;

    const LABEL: &'static str = "Employee";

    fn list(conn: &Connection) -> AppResult<Vec<Employee>> {
        let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY e.id_employee"))?;
        let employees = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(employees)
    }

    fn get(conn: &Connection, id: i64) -> AppResult<Option<Employee>> {
        let employee = conn
            .query_row(&format!("{SELECT} WHERE e.id_employee = ?1"), params![id], from_row)
            .optional()?;
        Ok(employee)
    }

    fn insert(conn: &Connection, new: &NewEmployee, _actor: &Session) -> AppResult<i64> {
        ensure_reference(conn, Reference::Department, new.department_id)?;
        conn.execute(
            "INSERT INTO employees (fio, position, birthdate, phnumber, email, department_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.fio,
                new.position,
                new.birthdate,
                new.phnumber,
                new.email,
                new.department_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(conn: &Connection, id: i64, patch: &EmployeePatch, _actor: &Session) -> AppResult<()> {
        let mut current = Self::get(conn, id)?.ok_or_else(|| Self::not_found(id))?;
        overwrite(&mut current.fio, &patch.fio);
        overwrite(&mut current.position, &patch.position);
        overwrite(&mut current.birthdate, &patch.birthdate);
        overwrite(&mut current.phnumber, &patch.phnumber);
        overwrite(&mut current.email, &patch.email);
        overwrite(&mut current.department_id, &patch.department_id);
        ensure_reference(conn, Reference::Department, current.department_id)?;

        conn.execute(
            "UPDATE employees
             SET fio = ?1, position = ?2, birthdate = ?3, phnumber = ?4, email = ?5, department_id = ?6
             WHERE id_employee = ?7",
            params![
                current.fio,
                current.position,
                current.birthdate,
                current.phnumber,
                current.email,
                current.department_id,
                id,
            ],
        )?;
        Ok(())
    }

    fn delete(conn: &Connection, id: i64) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM employees WHERE id_employee = ?1", params![id])?;
        expect_row::<Self>(affected, id)
    }
}
