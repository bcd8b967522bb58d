//! Error taxonomy shared by the data layer and the HTTP handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rusqlite::{ffi, ErrorCode};
use serde_json::json;
use thiserror::Error;

/// Every failure a request can end in.
#[derive(Debug, Error)]
pub enum AppError {
    /// The submitted role is not one of the known roles.
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A required field is missing or a field could not be parsed.
    #[error("{0}")]
    Validation(String),

    /// A foreign key points at a missing row, or a row is still referenced.
    #[error("{0}")]
    Referential(String),

    /// The database failed. The message is logged, never shown to the user.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("You do not have access to this page")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    /// No valid session accompanied the request.
    #[error("Please log in first")]
    Unauthenticated,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Errors the user can fix by resubmitting the form. Handlers turn these
    /// into a flash message and a redirect back to the form.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::InvalidRole(_)
                | AppError::InvalidCredentials
                | AppError::Validation(_)
                | AppError::Referential(_)
                | AppError::NotFound(_)
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if is_foreign_key_failure(&err) {
            return AppError::Referential("Record is referenced by other records".to_string());
        }
        AppError::Storage(err.to_string())
    }
}

/// SQLite reports a plain broken reference as `SQLITE_CONSTRAINT_FOREIGNKEY`,
/// but a delete blocked by `ON DELETE RESTRICT` comes back as
/// `SQLITE_CONSTRAINT_TRIGGER` with the same message.
fn is_foreign_key_failure(err: &rusqlite::Error) -> bool {
    let rusqlite::Error::SqliteFailure(e, message) = err else {
        return false;
    };
    if e.code != ErrorCode::ConstraintViolation {
        return false;
    }
    e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
        || (e.extended_code == ffi::SQLITE_CONSTRAINT_TRIGGER
            && message.as_deref() == Some("FOREIGN KEY constraint failed"))
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Storage(format!("password hashing failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated => return Redirect::to("/login").into_response(),
            AppError::Forbidden => return Redirect::to("/no_rights").into_response(),
            AppError::Storage(reason) => {
                tracing::error!(%reason, "storage failure");
                let body = Json(json!({
                    "status": "error",
                    "message": "The operation failed, no changes were saved",
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Referential(_) => StatusCode::CONFLICT,
            AppError::InvalidRole(_) | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
