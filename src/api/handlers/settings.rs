use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::actions::settings::{
    self, DeleteAccountInput, PasswordInput, ProfileInput, RotatedKey,
};
use crate::actions::Outcome;
use crate::api::response::AppJson;
use crate::session::{api_key_cookie, clear_auth_cookies, CurrentUser};
use crate::storage::models::UserProfile;
use crate::AppState;

pub async fn get_user(user: CurrentUser) -> Outcome<UserProfile> {
    settings::get_profile(&user)
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(input): AppJson<ProfileInput>,
) -> Outcome<UserProfile> {
    settings::update_profile(&state, &user, &input).await
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(input): AppJson<PasswordInput>,
) -> Outcome<()> {
    settings::update_password(&state, &user, &input).await
}

/// A deleted account also loses its cookies.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
    AppJson(input): AppJson<DeleteAccountInput>,
) -> (CookieJar, Outcome<()>) {
    let outcome = settings::delete_account(&state, &user, &input).await;
    let jar = if outcome.is_success() {
        clear_auth_cookies(jar)
    } else {
        jar
    };
    (jar, outcome)
}

pub async fn rotate_key(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Outcome<RotatedKey>) {
    let outcome = settings::rotate_api_key(&state, &user).await;
    let jar = match outcome.data {
        Some(ref key) => jar.add(api_key_cookie(&key.api_key, &state.config.auth)),
        None => jar,
    };
    (jar, outcome)
}
