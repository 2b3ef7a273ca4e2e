use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::forms::ImageForm;
use crate::actions::articles::{self, ArticleUpdateInput};
use crate::actions::images;
use crate::actions::Outcome;
use crate::api::response::AppJson;
use crate::session::CurrentUser;
use crate::storage::models::{ArticleRecord, ImageRecord, IndexUpdate};
use crate::AppState;

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(article_id): Path<String>,
    AppJson(input): AppJson<ArticleUpdateInput>,
) -> Outcome<ArticleRecord> {
    articles::update_article(&state, &user, &article_id, &input).await
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(article_id): Path<String>,
) -> Outcome<()> {
    articles::delete_article(&state, &user, &article_id).await
}

pub async fn list_images(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(article_id): Path<String>,
) -> Outcome<Vec<ImageRecord>> {
    images::list_article_images(&state, &user, &article_id).await
}

/// Multipart fields: `file` (image) and an optional `index`.
pub async fn create_image(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(article_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let (upload, index) = match ImageForm::read(multipart, "file").await.and_then(|form| {
        let index = form.index()?;
        Ok((form.require_file()?, index))
    }) {
        Ok(parts) => parts,
        Err(rejection) => return rejection.into_response(),
    };

    images::create_article_image(&state, &user, &article_id, &upload, index)
        .await
        .into_response()
}

pub async fn reorder_images(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(article_id): Path<String>,
    AppJson(updates): AppJson<Vec<IndexUpdate>>,
) -> Outcome<Vec<ImageRecord>> {
    images::reorder_images(&state, &user, &article_id, &updates).await
}
