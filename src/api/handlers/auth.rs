use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::actions::auth::{self, LoginInput, RegisterInput, SignedIn};
use crate::actions::Outcome;
use crate::api::response::AppJson;
use crate::session::{api_key_cookie, clear_auth_cookies, session_cookie, SESSION_COOKIE};
use crate::AppState;

/// Put the cookies of a fresh sign-in into the jar.
fn sign_in(jar: CookieJar, state: &AppState, outcome: &Outcome<SignedIn>) -> CookieJar {
    let Some(ref signed_in) = outcome.data else {
        return jar;
    };
    let jar = jar.add(session_cookie(&signed_in.session_token, &state.config.auth));
    match signed_in.api_key {
        Some(ref raw) => jar.add(api_key_cookie(raw, &state.config.auth)),
        None => jar,
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(input): AppJson<RegisterInput>,
) -> (CookieJar, Outcome<SignedIn>) {
    let outcome = auth::register(&state, &input).await;
    (sign_in(jar, &state, &outcome), outcome)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(input): AppJson<LoginInput>,
) -> (CookieJar, Outcome<SignedIn>) {
    let outcome = auth::login(&state, &input).await;
    (sign_in(jar, &state, &outcome), outcome)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Outcome<()>) {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let outcome = auth::logout(&state, token.as_deref()).await;
    (clear_auth_cookies(jar), outcome)
}
