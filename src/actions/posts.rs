use serde::Deserialize;

use super::validation::{self, ImageUpload};
use super::{owned_post, release_assets, ActionError, Outcome};
use crate::session::CurrentUser;
use crate::storage::models::{PostRecord, PostWithArticles};
use crate::AppState;

const NO_CHANGES: &str = "No changes were made";

#[derive(Debug, Deserialize)]
pub struct NewPostInput {
    pub title: String,
}

/// Changes submitted from the post form. Absent fields stay as they are.
#[derive(Debug, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub banner: Option<ImageUpload>,
}

pub async fn list_posts(state: &AppState, user: &CurrentUser) -> Outcome<Vec<PostRecord>> {
    let result = state
        .db
        .list_posts_by_user(user.id())
        .map_err(ActionError::from);
    Outcome::settle(result, "Posts loaded", "Failed to load posts")
}

pub async fn create_post(
    state: &AppState,
    user: &CurrentUser,
    input: &NewPostInput,
) -> Outcome<PostRecord> {
    let result = validation::post_title(&input.title)
        .and_then(|title| Ok(state.db.create_post(user.id(), title)?));
    if let Ok(ref post) = result {
        tracing::info!(post_id = %post.id, user_id = %user.id(), "Created post");
    }
    Outcome::settle(result, "Post created successfully", "Failed to create post")
}

/// A post with its articles and their images, all in display order.
pub async fn get_post(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
) -> Outcome<PostWithArticles> {
    let result = try_get_post(state, user, post_id);
    Outcome::settle(result, "Post loaded", "Failed to load post")
}

fn try_get_post(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
) -> Result<PostWithArticles, ActionError> {
    owned_post(&state.db, user, post_id)?;
    state
        .db
        .get_post_with_articles(post_id)?
        .ok_or_else(|| ActionError::NotFound("Post not found".to_string()))
}

/// Update the title and/or banner of a post.
///
/// A new banner is uploaded before the row changes. If the row cannot be
/// written the fresh upload is removed again; once it is written the previous
/// banner is released.
pub async fn update_post(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
    update: PostUpdate,
) -> Outcome<PostRecord> {
    let result = try_update_post(state, user, post_id, update).await;
    match result {
        Ok((post, false)) => Outcome::success(NO_CHANGES, post),
        other => Outcome::settle(
            other.map(|(post, _)| post),
            "Post updated successfully",
            "Failed to update post",
        ),
    }
}

/// Returns the post and whether anything was written.
async fn try_update_post(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
    update: PostUpdate,
) -> Result<(PostRecord, bool), ActionError> {
    let post = owned_post(&state.db, user, post_id)?;
    let title = update
        .title
        .as_deref()
        .map(validation::post_title)
        .transpose()?
        .filter(|t| *t != post.title);

    if title.is_none() && update.banner.is_none() {
        return Ok((post, false));
    }

    let updated = apply_post_update(state, &post, title, update.banner.as_ref()).await?;
    Ok((updated, true))
}

async fn apply_post_update(
    state: &AppState,
    post: &PostRecord,
    title: Option<&str>,
    banner: Option<&ImageUpload>,
) -> Result<PostRecord, ActionError> {
    let Some(banner) = banner else {
        return state
            .db
            .update_post(&post.id, title, None)?
            .ok_or_else(|| ActionError::NotFound("Post not found".to_string()));
    };

    banner.validate(state.config.max_image_size)?;
    let folder = format!("posts/{}/banner", post.id);
    let uploaded = state
        .media
        .upload(banner.data.clone(), &folder, &banner.file_name)
        .await?;

    let banner_ref = (uploaded.url.as_str(), uploaded.asset_id.as_str());
    let written = state.db.update_post(&post.id, title, Some(banner_ref));

    match written {
        Ok(Some(updated)) => {
            if let Some(ref previous) = post.banner_asset_id {
                release_assets(state.media.as_ref(), std::slice::from_ref(previous)).await;
            }
            Ok(updated)
        }
        Ok(None) => {
            release_assets(state.media.as_ref(), &[uploaded.asset_id]).await;
            Err(ActionError::NotFound("Post not found".to_string()))
        }
        Err(e) => {
            release_assets(state.media.as_ref(), &[uploaded.asset_id]).await;
            Err(e.into())
        }
    }
}

/// Delete a post with its articles and images, then release their assets.
pub async fn delete_post(state: &AppState, user: &CurrentUser, post_id: &str) -> Outcome<()> {
    let deleted = owned_post(&state.db, user, post_id).and_then(|_| {
        state
            .db
            .delete_post(post_id)?
            .ok_or_else(|| ActionError::NotFound("Post not found".to_string()))
    });

    let result = match deleted {
        Ok((post, released)) => {
            release_assets(state.media.as_ref(), &released.asset_ids).await;
            tracing::info!(post_id = %post.id, assets = released.asset_ids.len(), "Deleted post");
            Ok(())
        }
        Err(e) => Err(e),
    };
    Outcome::settle(result, "Post deleted successfully", "Failed to delete post")
}
