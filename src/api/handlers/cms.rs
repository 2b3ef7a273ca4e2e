use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::credentials::{parse_bearer, validate_api_key};
use crate::storage::models::{ImageRecord, PostWithArticles, UserRecord};
use crate::AppState;

/// Resolve the `Authorization: Bearer <key>` header to a user.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<UserRecord, ApiError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .ok_or(ApiError::Unauthorized)?;

    match validate_api_key(&state.db, presented) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(ApiError::Unauthorized),
        Err(e) => {
            tracing::error!(error = %e, "Failed to validate API key");
            Err(ApiError::Internal)
        }
    }
}

pub async fn get_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(image_id): Path<String>,
) -> Result<Json<ImageRecord>, ApiError> {
    let user = authorize(&state, &headers)?;

    let image = state
        .db
        .get_image(&image_id)
        .map_err(|e| {
            tracing::error!(image_id = %image_id, error = %e, "Failed to read image");
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound)?;

    tracing::debug!(image_id = %image_id, user_id = %user.id, "Served image");
    Ok(Json(image))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<Json<PostWithArticles>, ApiError> {
    let user = authorize(&state, &headers)?;

    let post = state
        .db
        .get_post_with_articles(&post_id)
        .map_err(|e| {
            tracing::error!(post_id = %post_id, error = %e, "Failed to read post");
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound)?;

    tracing::debug!(post_id = %post_id, user_id = %user.id, "Served post");
    Ok(Json(post))
}
