//! Registration, login and per-request sessions.
//!
//! A successful login produces a [`Session`], which is signed into a token
//! and handed to the browser in the `session` cookie. Every gated request
//! decodes that cookie again and checks it against the stored user, so the
//! role a request acts with always comes from its own session.

use crate::app::AppState;
use crate::db::{users, Database};
use crate::error::{AppError, AppResult};
use crate::handlers::blocking;
use crate::models::Role;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bcrypt::{hash, verify};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// The authenticated identity a request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    username: String,
    role: Role,
    exp: i64,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, session: &Session) -> AppResult<String> {
        let claims = Claims {
            sub: session.user_id,
            username: session.username.clone(),
            role: session.role,
            exp: (OffsetDateTime::now_utc() + self.ttl).unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Storage(format!("failed to sign session: {e}")))
    }

    /// Decodes a token and confirms it still matches the stored user.
    pub fn authenticate(&self, db: &Database, token: &str) -> AppResult<Session> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                warn!(error = %e, "rejected session token");
                AppError::Unauthenticated
            })?
            .claims;

        let user = db
            .read(|conn| users::get(conn, claims.sub))?
            .ok_or(AppError::Unauthenticated)?;
        if user.role != claims.role || user.username != claims.username {
            warn!(user_id = user.id, "session no longer matches stored user");
            return Err(AppError::Unauthenticated);
        }

        Ok(Session {
            user_id: user.id,
            username: user.username,
            role: user.role,
        })
    }

    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(self.ttl)
            .build()
    }
}

/// Removal cookie for logout.
pub fn expired_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Creates an account. The role is checked before anything is written.
///
/// # Errors
///
/// * [`AppError::InvalidRole`] if `form.role` is not a known role.
/// * [`AppError::Validation`] if the username or password is empty, or the
///   username is taken.
/// * [`AppError::Storage`] if hashing or the insert fails.
pub fn register(db: &Database, form: &Registration, cost: u32) -> AppResult<i64> {
    let role: Role = form.role.parse()?;
    let username = form.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username cannot be empty"));
    }
    if form.password.is_empty() {
        return Err(AppError::validation("Password cannot be empty"));
    }

    // Hash the password before taking the connection lock
    let password_hash = hash(&form.password, cost)?;

    let id = db.write(|tx| {
        if users::find_by_username(tx, username)?.is_some() {
            return Err(AppError::validation(format!(
                "Username {username} is already taken"
            )));
        }
        users::insert(tx, username, &password_hash, role)
    })?;

    info!(%username, %role, user_id = id, "registered user");
    Ok(id)
}

/// Verifies credentials and returns the session to issue.
///
/// # Errors
///
/// Returns [`AppError::InvalidCredentials`] for an unknown user or a wrong
/// password, without saying which.
pub fn login(db: &Database, credentials: &Credentials) -> AppResult<Session> {
    let user = db.read(|conn| users::find_by_username(conn, credentials.username.trim()))?;
    let Some(user) = user else {
        warn!(username = %credentials.username, "login for unknown user");
        return Err(AppError::InvalidCredentials);
    };

    if !verify(&credentials.password, &user.password_hash)? {
        warn!(username = %user.username, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    info!(username = %user.username, role = %user.role, "login successful");
    Ok(Session {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let sessions = state.sessions.clone();
        let db = state.db.clone();
        blocking(move || sessions.authenticate(&db, &token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::db;

    const COST: u32 = 4;

    fn keys() -> SessionKeys {
        SessionKeys::new(b"test-secret", Duration::hours(1))
    }

    fn registration(username: &str, password: &str, role: &str) -> Registration {
        Registration {
            username: username.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn invalid_role_persists_nothing() {
        let db = db();
        for role in ["janitor", "hr", "Nurse", ""] {
            let err = register(&db, &registration("alice", "pw1", role), COST).unwrap_err();
            assert!(matches!(err, AppError::InvalidRole(_)), "{role}: {err:?}");
        }
        assert_eq!(db.read(users::count).unwrap(), 0);
    }

    #[test]
    fn login_yields_the_stored_role() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();

        let session = login(&db, &credentials("alice", "pw1")).unwrap();
        assert_eq!(session.role, Role::Nurse);
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn wrong_password_or_unknown_user_is_invalid_credentials() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();

        assert!(matches!(
            login(&db, &credentials("alice", "pw2")),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&db, &credentials("mallory", "pw1")),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_or_blank_registrations_are_validation_errors() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();

        let dup = register(&db, &registration("alice", "other", "doctor"), COST).unwrap_err();
        assert!(matches!(dup, AppError::Validation(_)));
        let blank = register(&db, &registration("  ", "pw", "doctor"), COST).unwrap_err();
        assert!(matches!(blank, AppError::Validation(_)));
        let no_pw = register(&db, &registration("bob", "", "doctor"), COST).unwrap_err();
        assert!(matches!(no_pw, AppError::Validation(_)));
        assert_eq!(db.read(users::count).unwrap(), 1);
    }

    #[test]
    fn issued_tokens_authenticate_back_to_the_same_session() {
        let db = db();
        register(&db, &registration("alice", "pw1", "HR"), COST).unwrap();
        let session = login(&db, &credentials("alice", "pw1")).unwrap();

        let keys = keys();
        let token = keys.issue(&session).unwrap();
        assert_eq!(keys.authenticate(&db, &token).unwrap(), session);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();
        let session = login(&db, &credentials("alice", "pw1")).unwrap();

        let forged = SessionKeys::new(b"other-secret", Duration::hours(1))
            .issue(&session)
            .unwrap();
        assert!(matches!(
            keys().authenticate(&db, &forged),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn token_with_stale_role_is_rejected() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();
        let mut session = login(&db, &credentials("alice", "pw1")).unwrap();
        session.role = Role::Superuser;

        let token = keys().issue(&session).unwrap();
        assert!(matches!(
            keys().authenticate(&db, &token),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let db = db();
        register(&db, &registration("alice", "pw1", "nurse"), COST).unwrap();
        let session = login(&db, &credentials("alice", "pw1")).unwrap();

        let expired = SessionKeys::new(b"test-secret", Duration::hours(-2))
            .issue(&session)
            .unwrap();
        assert!(keys().authenticate(&db, &expired).is_err());
    }
}
