//! Session gate: turns the `session` cookie into an explicit [`CurrentUser`].
//!
//! A missing, unknown or expired session never reaches a handler. The request
//! is answered with a sign-out instead: both auth cookies are cleared and the
//! client is redirected to the login page.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::AuthConfig;
use crate::credentials::hash_key;
use crate::storage::models::UserRecord;
use crate::storage::{Database, DatabaseError};
use crate::AppState;

pub const SESSION_COOKIE: &str = "session";
pub const API_KEY_COOKIE: &str = "user_api_key";

const API_KEY_COOKIE_DAYS: i64 = 365;

/// The authenticated identity, passed explicitly into every action.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserRecord,
    /// Hash of the session token this request presented
    pub session_hash: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// Look up a raw session token. Expired sessions are deleted and reported as absent.
pub fn resolve_session(db: &Database, token: &str) -> Result<Option<CurrentUser>, DatabaseError> {
    let session_hash = hash_key(token);

    let Some(session) = db.get_session(&session_hash)? else {
        return Ok(None);
    };

    if session.is_expired() {
        db.delete_session(&session_hash)?;
        return Ok(None);
    }

    Ok(db
        .get_user(&session.user_id)?
        .map(|user| CurrentUser { user, session_hash }))
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = SignOut;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, SignOut> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Err(SignOut::new(&state.config.auth));
        };

        match resolve_session(&state.db, &token) {
            Ok(Some(current)) => Ok(current),
            Ok(None) => {
                tracing::debug!("Unknown or expired session, signing out");
                Err(SignOut::new(&state.config.auth))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to resolve session");
                Err(SignOut::new(&state.config.auth))
            }
        }
    }
}

/// Clears the auth cookies and redirects to the login page.
#[derive(Debug)]
pub struct SignOut {
    login_path: String,
}

impl SignOut {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            login_path: config.login_path.clone(),
        }
    }
}

impl IntoResponse for SignOut {
    fn into_response(self) -> Response {
        (
            clear_auth_cookies(CookieJar::new()),
            Redirect::to(&self.login_path),
        )
            .into_response()
    }
}

// ============================================================================
// Cookies
// ============================================================================

fn auth_cookie(name: &'static str, value: String, secure: bool, days: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(days))
        .path("/")
        .build()
}

pub fn session_cookie(token: &str, config: &AuthConfig) -> Cookie<'static> {
    auth_cookie(
        SESSION_COOKIE,
        token.to_string(),
        config.secure_cookies,
        config.session_ttl_days,
    )
}

pub fn api_key_cookie(raw_key: &str, config: &AuthConfig) -> Cookie<'static> {
    auth_cookie(
        API_KEY_COOKIE,
        raw_key.to_string(),
        config.secure_cookies,
        API_KEY_COOKIE_DAYS,
    )
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    cookie.make_removal();
    cookie
}

/// Expire both auth cookies. Works on an empty jar, unlike `CookieJar::remove`.
pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(SESSION_COOKIE))
        .add(removal_cookie(API_KEY_COOKIE))
}
