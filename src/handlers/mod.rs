//! HTTP handlers.
//!
//! GET pages answer with a JSON document; POST forms mutate and then redirect
//! back with a flash message, so a browser never resubmits a form on reload.

use crate::access::{self, Operation, Resource};
use crate::app::AppState;
use crate::auth::Session;
use crate::db::{Command, Table};
use crate::error::{AppError, AppResult};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

pub mod auth;
pub mod departments;
pub mod diseases;
pub mod employees;
pub mod medications;
pub mod patients;

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Success,
    Danger,
}

/// One-shot message shown on the page a redirect lands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: Category::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: Category::Danger,
            message: message.into(),
        }
    }
}

/// Stores `flash` in a cookie and redirects to `to` with 303 See Other.
pub(crate) fn redirect_with(jar: CookieJar, to: &str, flash: Flash) -> Response {
    // Serializing two strings cannot fail
    let value = serde_json::to_string(&flash).unwrap_or_default();
    let cookie = Cookie::build((FLASH_COOKIE, value)).path("/").http_only(true);
    (jar.add(cookie), Redirect::to(to)).into_response()
}

/// Pops the pending flash message, if any.
pub(crate) fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = serde_json::from_str(cookie.value()).ok();
    (jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/")), flash)
}

/// Ends a POST: success and user-fixable errors redirect to `to` with a
/// flash message, everything else propagates as an error response.
pub(crate) fn finish(jar: CookieJar, to: &str, outcome: AppResult<String>) -> AppResult<Response> {
    match outcome {
        Ok(message) => Ok(redirect_with(jar, to, Flash::success(message))),
        Err(err) if err.is_recoverable() => {
            info!(error = %err, redirect = to, "form rejected");
            Ok(redirect_with(jar, to, Flash::danger(err.to_string())))
        }
        Err(err) => Err(err),
    }
}

/// Runs blocking work (SQLite, bcrypt) off the async executor.
pub(crate) async fn blocking<T, F>(f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Storage(format!("worker task failed: {e}")))?
}

/// GET handler body shared by every resource page.
pub(crate) async fn list_page<T: Table>(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    resource: Resource,
) -> AppResult<(CookieJar, Json<Value>)> {
    access::require(session.role, resource, Operation::Read)?;
    let db = state.db.clone();
    let rows = blocking(move || db.list::<T>()).await?;
    let (jar, flash) = take_flash(jar);

    Ok((
        jar,
        Json(json!({
            "status": "ok",
            "user": session,
            "resource": resource,
            "allowed": access::allowed_operations(session.role, resource),
            "flash": flash,
            "rows": rows,
        })),
    ))
}

/// POST handler body shared by every resource page.
///
/// `command` decodes the form; it only runs once access has been granted.
pub(crate) async fn submit_form<T: Table>(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    resource: Resource,
    command: impl FnOnce() -> AppResult<Command<T>>,
) -> AppResult<Response> {
    access::require(session.role, resource, Operation::Write)?;
    let outcome = match command() {
        Ok(command) => {
            let db = state.db.clone();
            let actor = session.clone();
            blocking(move || db.apply::<T>(command, &actor))
                .await
                .map(|change| change.describe(T::LABEL))
        }
        Err(err) => Err(err),
    };
    finish(jar, resource.path(), outcome)
}

pub async fn index() -> Redirect {
    Redirect::to("/login")
}

pub async fn no_rights() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "status": "error",
            "message": AppError::Forbidden.to_string(),
        })),
    )
}

/// Landing page after login: the resources the user's role may open.
pub async fn all_data(session: Session, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let resources: Vec<Value> = Resource::ALL
        .into_iter()
        .filter_map(|resource| {
            let allowed = access::allowed_operations(session.role, resource);
            (!allowed.is_empty()).then(|| {
                json!({
                    "resource": resource,
                    "path": resource.path(),
                    "allowed": allowed,
                })
            })
        })
        .collect();
    let (jar, flash) = take_flash(jar);

    (
        jar,
        Json(json!({
            "status": "ok",
            "user": session,
            "flash": flash,
            "resources": resources,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{LOCATION, SET_COOKIE};

    #[test]
    fn recoverable_errors_redirect_with_a_danger_flash() {
        let response = finish(
            CookieJar::new(),
            "/departments",
            Err(AppError::validation("department_name is required")),
        )
        .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/departments");
        let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("flash="), "{cookie}");
    }

    #[test]
    fn storage_and_access_errors_propagate() {
        assert!(matches!(
            finish(CookieJar::new(), "/x", Err(AppError::Storage("boom".into()))),
            Err(AppError::Storage(_))
        ));
        assert!(matches!(
            finish(CookieJar::new(), "/x", Err(AppError::Forbidden)),
            Err(AppError::Forbidden)
        ));
    }

    fn state() -> AppState {
        AppState::new(
            crate::db::testing::db(),
            crate::auth::SessionKeys::new(b"handler-tests", time::Duration::hours(1)),
            4,
        )
    }

    #[tokio::test]
    async fn submit_and_list_run_on_the_blocking_pool() {
        use crate::db::departments::{Departments, NewDepartment};
        use crate::models::Role;

        let state = state();
        let nurse = crate::db::testing::session(&state.db, "joy", Role::Nurse);

        let response = submit_form::<Departments>(
            &state,
            &nurse,
            CookieJar::new(),
            Resource::Departments,
            || {
                Ok(Command::Insert(NewDepartment {
                    department_name: "Surgery".into(),
                    fio_doctor: None,
                }))
            },
        )
        .await
        .unwrap();
        assert_eq!(response.headers()[LOCATION], "/departments");

        let (_, Json(page)) =
            list_page::<Departments>(&state, &nurse, CookieJar::new(), Resource::Departments)
                .await
                .unwrap();
        assert_eq!(page["rows"][0]["department_name"], "Surgery");
    }

    #[tokio::test]
    async fn denied_submit_never_decodes_the_form() {
        use crate::db::departments::Departments;
        use crate::models::Role;

        let state = state();
        let doctor = crate::db::testing::session(&state.db, "house", Role::Doctor);
        let outcome = submit_form::<Departments>(
            &state,
            &doctor,
            CookieJar::new(),
            Resource::Departments,
            || panic!("form decoded before the access check"),
        )
        .await;
        assert!(matches!(outcome, Err(AppError::Forbidden)));
    }

    #[test]
    fn flash_is_read_once() {
        let flash = Flash::danger("Department 4 not found");
        let jar = CookieJar::new().add(Cookie::new(
            FLASH_COOKIE,
            serde_json::to_string(&flash).unwrap(),
        ));

        let (jar, taken) = take_flash(jar);
        assert_eq!(taken, Some(flash));
        assert!(jar.get(FLASH_COOKIE).is_none());

        let (_, again) = take_flash(jar);
        assert_eq!(again, None);
    }
}
