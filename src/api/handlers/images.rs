use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::forms::ImageForm;
use crate::actions::images::{self, UserImages};
use crate::actions::Outcome;
use crate::session::CurrentUser;
use crate::AppState;

pub async fn list_images(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Outcome<UserImages> {
    images::list_user_images(&state, &user).await
}

/// Multipart fields: `file` (image) and an optional `index`.
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> Response {
    let (upload, index) = match ImageForm::read(multipart, "file").await.and_then(|form| {
        let index = form.index()?;
        Ok((form.require_file()?, index))
    }) {
        Ok(parts) => parts,
        Err(rejection) => return rejection.into_response(),
    };

    images::create_user_image(&state, &user, &upload, index)
        .await
        .into_response()
}

/// Multipart field: `file` (image).
pub async fn replace_image(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(image_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let upload = match ImageForm::read(multipart, "file")
        .await
        .and_then(ImageForm::require_file)
    {
        Ok(upload) => upload,
        Err(rejection) => return rejection.into_response(),
    };

    images::replace_image(&state, &user, &image_id, &upload)
        .await
        .into_response()
}

pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(image_id): Path<String>,
) -> Outcome<()> {
    images::delete_image(&state, &user, &image_id).await
}
