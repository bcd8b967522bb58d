//! Register, login and logout pages.

use super::{blocking, finish, redirect_with, take_flash, Flash};
use crate::app::AppState;
use crate::auth::{self, Credentials, Registration, Session};
use crate::models::Role;
use axum::{extract::State, response::Response, Form, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use tracing::info;

pub async fn register_form(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let (jar, flash) = take_flash(jar);
    let roles: Vec<&str> = Role::ALL.iter().map(Role::as_str).collect();
    (
        jar,
        Json(json!({
            "status": "ok",
            "form": "register",
            "fields": ["username", "password", "role"],
            "roles": roles,
            "flash": flash,
        })),
    )
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<Registration>,
) -> Result<Response, crate::error::AppError> {
    let db = state.db.clone();
    let cost = state.bcrypt_cost;
    let outcome = blocking(move || auth::register(&db, &form, cost)).await;

    match outcome {
        Ok(_) => Ok(redirect_with(jar, "/login", Flash::success("Registration successful!"))),
        Err(err) => finish(jar, "/register", Err(err)),
    }
}

pub async fn login_form(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let (jar, flash) = take_flash(jar);
    (
        jar,
        Json(json!({
            "status": "ok",
            "form": "login",
            "fields": ["username", "password"],
            "flash": flash,
        })),
    )
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<Response, crate::error::AppError> {
    let db = state.db.clone();
    let outcome = blocking(move || auth::login(&db, &credentials)).await;

    match outcome {
        Ok(session) => {
            let token = state.sessions.issue(&session)?;
            let jar = jar.add(state.sessions.cookie(token));
            Ok(redirect_with(jar, "/all_data", Flash::success("Login successful!")))
        }
        Err(err) => finish(jar, "/login", Err(err)),
    }
}

/// Clears the session cookie whether or not it was valid.
pub async fn logout(session: Option<Session>, jar: CookieJar) -> Response {
    if let Some(session) = session {
        info!(username = %session.username, "logged out");
    }
    let jar = jar.remove(auth::expired_cookie());
    redirect_with(jar, "/", Flash::success("You have been logged out."))
}
