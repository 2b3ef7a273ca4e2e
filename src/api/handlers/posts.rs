use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::forms::ImageForm;
use crate::actions::articles::{self, NewArticleInput};
use crate::actions::posts::{self, NewPostInput, PostUpdate};
use crate::actions::Outcome;
use crate::api::response::AppJson;
use crate::session::CurrentUser;
use crate::storage::models::{ArticleRecord, IndexUpdate, PostRecord, PostWithArticles};
use crate::AppState;

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Outcome<Vec<PostRecord>> {
    posts::list_posts(&state, &user).await
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    AppJson(input): AppJson<NewPostInput>,
) -> Outcome<PostRecord> {
    posts::create_post(&state, &user, &input).await
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> Outcome<PostWithArticles> {
    posts::get_post(&state, &user, &post_id).await
}

/// Multipart fields: `title` (text) and `banner` (image), both optional.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let form = match ImageForm::read(multipart, "banner").await {
        Ok(form) => form,
        Err(rejection) => return rejection.into_response(),
    };

    let update = PostUpdate {
        title: form.text("title").map(str::to_string),
        banner: form.file,
    };
    posts::update_post(&state, &user, &post_id, update)
        .await
        .into_response()
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> Outcome<()> {
    posts::delete_post(&state, &user, &post_id).await
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    AppJson(input): AppJson<NewArticleInput>,
) -> Outcome<ArticleRecord> {
    articles::create_article(&state, &user, &post_id, &input).await
}

pub async fn reorder_articles(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    AppJson(updates): AppJson<Vec<IndexUpdate>>,
) -> Outcome<Vec<ArticleRecord>> {
    articles::reorder_articles(&state, &user, &post_id, &updates).await
}
