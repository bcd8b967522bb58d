//! Decoding of urlencoded form fields.
//!
//! Form structs keep every field as `Option<String>`: `None` means the field
//! was not submitted, an empty string means "clear it". The helpers here turn
//! those raw values into typed values, with empty strings becoming null.

use crate::error::{AppError, AppResult};
use std::str::FromStr;
use time::{macros::format_description, Date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "insert" => Ok(Action::Insert),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "" => Err(AppError::validation("action is required")),
            other => Err(AppError::validation(format!("Unknown action: {other}"))),
        }
    }
}

pub fn action(raw: Option<&str>) -> AppResult<Action> {
    raw.unwrap_or_default().parse()
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn text(raw: Option<&str>) -> AppResult<Option<String>> {
    Ok(non_empty(raw).map(str::to_string))
}

pub fn integer(name: &str, raw: Option<&str>) -> AppResult<Option<i64>> {
    non_empty(raw)
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::validation(format!("{name} must be a whole number")))
        })
        .transpose()
}

pub fn date(name: &str, raw: Option<&str>) -> AppResult<Option<Date>> {
    non_empty(raw)
        .map(|s| {
            Date::parse(s, format_description!("[year]-[month]-[day]"))
                .map_err(|_| AppError::validation(format!("{name} must be a date (YYYY-MM-DD)")))
        })
        .transpose()
}

/// Parses a decimal amount such as `12.5` into cents.
pub fn price(name: &str, raw: Option<&str>) -> AppResult<Option<i64>> {
    let Some(s) = non_empty(raw) else {
        return Ok(None);
    };
    let invalid = || AppError::validation(format!("{name} must be an amount like 12.50"));

    let (units, fraction) = s.split_once('.').unwrap_or((s, ""));
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if units.is_empty() || !digits(units) || fraction.len() > 2 || !digits(fraction) {
        return Err(invalid());
    }

    let units: i64 = units.parse().map_err(|_| invalid())?;
    let cents: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;
    units
        .checked_mul(100)
        .and_then(|u| u.checked_add(cents))
        .map(Some)
        .ok_or_else(invalid)
}

/// A value that must be present and non-empty.
pub fn required<T>(name: &str, value: Option<T>) -> AppResult<T> {
    value.ok_or_else(|| AppError::validation(format!("{name} is required")))
}

/// A primary key naming the row to update or delete.
pub fn key(name: &str, raw: Option<&str>) -> AppResult<i64> {
    required(name, integer(name, raw)?)
}

/// Tri-state decoding for updates: absent → `None` (keep), empty → `Some(None)`
/// (clear), value → `Some(Some(v))`.
pub fn patch<T>(
    raw: Option<&str>,
    parse: impl FnOnce(Option<&str>) -> AppResult<Option<T>>,
) -> AppResult<Option<Option<T>>> {
    match raw {
        None => Ok(None),
        Some(_) => parse(raw).map(Some),
    }
}

/// Like [`patch`] for fields that cannot be cleared.
pub fn patch_required<T>(
    name: &str,
    raw: Option<&str>,
    parse: impl FnOnce(Option<&str>) -> AppResult<Option<T>>,
) -> AppResult<Option<T>> {
    match patch(raw, parse)? {
        None => Ok(None),
        Some(value) => required(name, value).map(Some),
    }
}
