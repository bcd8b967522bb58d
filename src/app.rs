//! Application state and routing.

use crate::auth::SessionKeys;
use crate::config::Config;
use crate::db::Database;
use crate::handlers::{self, auth as login, departments, diseases, employees, medications, patients};
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// State shared by all handlers. Nothing in here depends on who is logged in.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionKeys,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(db: Database, sessions: SessionKeys, bcrypt_cost: u32) -> Self {
        Self {
            db,
            sessions,
            bcrypt_cost,
        }
    }

    /// Opens the database and prepares the session keys described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database)
            .with_context(|| format!("Failed to open database {}", config.database.display()))?;

        if let Some(bootstrap) = &config.bootstrap {
            let password_hash = bcrypt::hash(&bootstrap.password, config.bcrypt_cost)
                .context("Failed to hash bootstrap password")?;
            db.ensure_superuser(bootstrap.username.trim(), &password_hash)
                .context("Failed to create bootstrap user")?;
        }

        let secret = match &config.session_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("no session_secret configured, sessions will not survive a restart");
                format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
            }
        };
        let sessions = SessionKeys::new(
            secret.as_bytes(),
            Duration::minutes(config.session_ttl_minutes),
        );

        Ok(Self::new(db, sessions, config.bcrypt_cost))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/index", get(handlers::index))
        .route("/register", get(login::register_form).post(login::register))
        .route("/login", get(login::login_form).post(login::login))
        .route("/logout", get(login::logout))
        .route("/no_rights", get(handlers::no_rights))
        .route("/all_data", get(handlers::all_data))
        .route("/departments", get(departments::list).post(departments::submit))
        .route("/diseases", get(diseases::list).post(diseases::submit))
        .route("/medications", get(medications::list).post(medications::submit))
        .route("/employees", get(employees::list).post(employees::submit))
        .route("/patients", get(patients::list).post(patients::submit))
        .route("/patients/:id/edit", get(patients::edit_form).post(patients::edit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
