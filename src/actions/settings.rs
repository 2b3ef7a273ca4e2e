use serde::{Deserialize, Serialize};

use super::{release_assets, validation, ActionError, Outcome};
use crate::credentials;
use crate::session::CurrentUser;
use crate::storage::models::{ReleasedAssets, UserProfile};
use crate::AppState;

const WRONG_PASSWORD: &str = "Current password does not match";

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordInput {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountInput {
    pub password: String,
}

/// A newly issued API key, shown to the user exactly once.
#[derive(Debug, Serialize)]
pub struct RotatedKey {
    pub api_key: String,
}

fn user_not_found() -> ActionError {
    ActionError::NotFound("User not found".to_string())
}

pub fn get_profile(user: &CurrentUser) -> Outcome<UserProfile> {
    Outcome::success("User loaded", UserProfile::from(&user.user))
}

pub async fn update_profile(
    state: &AppState,
    user: &CurrentUser,
    input: &ProfileInput,
) -> Outcome<UserProfile> {
    let result = try_update_profile(state, user, input);
    match result {
        Ok((profile, false)) => Outcome::success("No changes were made", profile),
        other => Outcome::settle(
            other.map(|(profile, _)| profile),
            "Profile updated successfully",
            "Failed to update profile",
        ),
    }
}

/// Returns the profile and whether anything was written.
fn try_update_profile(
    state: &AppState,
    user: &CurrentUser,
    input: &ProfileInput,
) -> Result<(UserProfile, bool), ActionError> {
    let name = validation::name(&input.name)?;
    let email = validation::email(&input.email)?;

    let name = (name != user.user.name).then_some(name);
    let email = (email != user.user.email).then_some(email);
    if name.is_none() && email.is_none() {
        return Ok((UserProfile::from(&user.user), false));
    }

    let updated = state
        .db
        .update_user_profile(user.id(), name, email)?
        .ok_or_else(user_not_found)?;

    Ok((UserProfile::from(&updated), true))
}

pub async fn update_password(
    state: &AppState,
    user: &CurrentUser,
    input: &PasswordInput,
) -> Outcome<()> {
    let result = try_update_password(state, user, input);
    Outcome::settle(result, "Password updated successfully", "Failed to update password")
}

fn try_update_password(
    state: &AppState,
    user: &CurrentUser,
    input: &PasswordInput,
) -> Result<(), ActionError> {
    if !credentials::verify_password(&user.user.password_hash, &input.current_password) {
        return Err(ActionError::Auth(WRONG_PASSWORD.to_string()));
    }
    let new_password = validation::password(&input.new_password)?;
    let password_hash = credentials::hash_password(new_password)?;

    state
        .db
        .update_user_password(user.id(), &password_hash)?
        .ok_or_else(user_not_found)?;
    Ok(())
}

/// Delete the account after re-checking its password, then release every
/// asset the cascade removed.
pub async fn delete_account(
    state: &AppState,
    user: &CurrentUser,
    input: &DeleteAccountInput,
) -> Outcome<()> {
    let result = match try_delete_account(state, user, input) {
        Ok(released) => {
            release_assets(state.media.as_ref(), &released.asset_ids).await;
            tracing::info!(user_id = %user.id(), "Deleted account");
            Ok(())
        }
        Err(e) => Err(e),
    };
    Outcome::settle(result, "Account deleted successfully", "Failed to delete account")
}

fn try_delete_account(
    state: &AppState,
    user: &CurrentUser,
    input: &DeleteAccountInput,
) -> Result<ReleasedAssets, ActionError> {
    if !credentials::verify_password(&user.user.password_hash, &input.password) {
        return Err(ActionError::Auth(WRONG_PASSWORD.to_string()));
    }
    state.db.delete_user(user.id())?.ok_or_else(user_not_found)
}

/// Replace the user's API key. The previous key stops working immediately.
pub async fn rotate_api_key(state: &AppState, user: &CurrentUser) -> Outcome<RotatedKey> {
    let result = try_rotate_api_key(state, user);
    Outcome::settle(result, "Key updated successfully", "Failed to generate a new key")
}

fn try_rotate_api_key(state: &AppState, user: &CurrentUser) -> Result<RotatedKey, ActionError> {
    let key = credentials::issue_api_key(&state.db, state.config.auth.api_key_max_attempts)?;
    state
        .db
        .rotate_user_api_key(user.id(), &key.hashed)?
        .ok_or_else(user_not_found)?;
    Ok(RotatedKey { api_key: key.raw })
}
