use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{validation, ActionError, FailureKind, Outcome};
use crate::credentials::{self, IssuedKey, SESSION_TOKEN_PREFIX};
use crate::storage::models::UserProfile;
use crate::storage::NewUser;
use crate::AppState;

const INVALID_LOGIN: &str = "Invalid email and/or password";

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// A freshly opened session. The secrets travel in cookies, never in the body.
#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: UserProfile,
    #[serde(skip)]
    pub session_token: String,
    /// Raw API key, present only when one was just issued
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn open_session(state: &AppState, user_id: &str) -> Result<String, ActionError> {
    let token = IssuedKey::generate(SESSION_TOKEN_PREFIX)?;
    state.db.create_session(
        &token.hashed,
        user_id,
        Duration::days(state.config.auth.session_ttl_days),
    )?;
    Ok(token.raw)
}

/// Create an account, issue its API key and sign it in.
pub async fn register(state: &AppState, input: &RegisterInput) -> Outcome<SignedIn> {
    let result = try_register(state, input);
    Outcome::settle(result, "User created successfully", "Failed to create user. Try again.")
}

fn try_register(state: &AppState, input: &RegisterInput) -> Result<SignedIn, ActionError> {
    let name = validation::name(&input.name)?;
    let email = validation::email(&input.email)?;
    let password = validation::password(&input.password)?;

    let password_hash = credentials::hash_password(password)?;
    let api_key = credentials::issue_api_key(&state.db, state.config.auth.api_key_max_attempts)?;

    let user = state.db.create_user(&NewUser {
        name,
        email,
        password_hash: &password_hash,
        api_key_hash: &api_key.hashed,
    })?;
    let session_token = open_session(state, &user.id)?;

    tracing::info!(user_id = %user.id, "Registered user");

    Ok(SignedIn {
        user: UserProfile::from(&user),
        session_token,
        api_key: Some(api_key.raw),
    })
}

pub async fn login(state: &AppState, input: &LoginInput) -> Outcome<SignedIn> {
    let result = try_login(state, input);
    Outcome::settle(result, "Logged in successfully", "Failed to log in")
}

fn try_login(state: &AppState, input: &LoginInput) -> Result<SignedIn, ActionError> {
    // Unknown email and wrong password are indistinguishable
    let user = state
        .db
        .get_user_by_email(input.email.trim())?
        .filter(|user| credentials::verify_password(&user.password_hash, &input.password))
        .ok_or_else(|| ActionError::Auth(INVALID_LOGIN.to_string()))?;

    let session_token = open_session(state, &user.id)?;

    tracing::debug!(user_id = %user.id, "User logged in");

    Ok(SignedIn {
        user: UserProfile::from(&user),
        session_token,
        api_key: None,
    })
}

/// End the session identified by the raw token, if there is one.
pub async fn logout(state: &AppState, session_token: Option<&str>) -> Outcome<()> {
    let Some(token) = session_token else {
        return Outcome::success("Logged out", ());
    };

    match state.db.delete_session(&credentials::hash_key(token)) {
        Ok(_) => Outcome::success("Logged out", ()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete session");
            Outcome::failure(FailureKind::Unknown, "Failed to log out")
        }
    }
}
