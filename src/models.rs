//! Data models for the hospital records service.

use crate::error::AppError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The role stored on a user account. It decides everything the user may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "patient")]
    Patient,
    #[serde(rename = "nurse")]
    Nurse,
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "superuser")]
    Superuser,
    #[serde(rename = "HR")]
    Hr,
    #[serde(rename = "administrator")]
    Administrator,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Patient,
        Role::Nurse,
        Role::Doctor,
        Role::Superuser,
        Role::Hr,
        Role::Administrator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Nurse => "nurse",
            Role::Doctor => "doctor",
            Role::Superuser => "superuser",
            Role::Hr => "HR",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    /// Role names are matched exactly; `hr` is not `HR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::InvalidRole(s.to_string()))
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: AppError| FromSqlError::Other(Box::new(e)))
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Department {
    pub id_department: i64,
    pub department_name: String,
    pub fio_doctor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Disease {
    pub id_disease: i64,
    pub code: String,
    pub name: String,
    pub department_id: Option<i64>,
    /// Joined from `departments` for display.
    pub department_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Medication {
    pub id_medication: i64,
    pub name: String,
    pub release_form: Option<String>,
    pub registry_form: Option<String>,
    pub quantity: Option<i64>,
    #[serde(with = "iso_date::option")]
    pub expiration_date: Option<Date>,
    /// Price in cents, rendered as a decimal string.
    #[serde(serialize_with = "serialize_cents")]
    pub price: Option<i64>,
    pub disease_id: Option<i64>,
    pub disease_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub id_employee: i64,
    pub fio: String,
    pub position: Option<String>,
    #[serde(with = "iso_date::option")]
    pub birthdate: Option<Date>,
    pub phnumber: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id_patient: i64,
    pub fio: String,
    #[serde(with = "iso_date::option")]
    pub birthdate: Option<Date>,
    pub disease_id: Option<i64>,
    pub disease_name: Option<String>,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub editor_id: Option<i64>,
    /// Full name of the staff member who last changed the record.
    pub editor_fio: Option<String>,
}

/// Formats integer cents as `units.cc`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

fn serialize_cents<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(cents) => serializer.serialize_str(&format_cents(*cents)),
        None => serializer.serialize_none(),
    }
}
