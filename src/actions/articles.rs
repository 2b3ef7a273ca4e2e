use serde::Deserialize;

use super::validation;
use super::{owned_article, owned_post, release_assets, ActionError, Outcome};
use crate::session::CurrentUser;
use crate::storage::models::{ArticleRecord, IndexUpdate, Patch};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewArticleInput {
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    /// Position among the post's articles; appended at the end when omitted
    #[serde(default)]
    pub index: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ArticleUpdateInput {
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
}

pub async fn create_article(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
    input: &NewArticleInput,
) -> Outcome<ArticleRecord> {
    let result = try_create_article(state, user, post_id, input);
    Outcome::settle(result, "Article created successfully", "Failed to create article")
}

fn try_create_article(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
    input: &NewArticleInput,
) -> Result<ArticleRecord, ActionError> {
    owned_post(&state.db, user, post_id)?;
    let title = validation::article_title(input.title.as_deref())?;
    let text = validation::article_text(&input.text)?;

    let index = match input.index {
        Some(index) => index,
        None => state.db.list_articles_by_post(post_id)?.len() as i32,
    };

    let article = state.db.create_article(post_id, title, text, index)?;
    tracing::debug!(article_id = %article.id, post_id = %post_id, index, "Created article");
    Ok(article)
}

/// Replace an article's title and text. A blank title removes it.
pub async fn update_article(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
    input: &ArticleUpdateInput,
) -> Outcome<ArticleRecord> {
    let result = try_update_article(state, user, article_id, input);
    match result {
        Ok((article, false)) => Outcome::success("No changes were made", article),
        other => Outcome::settle(
            other.map(|(article, _)| article),
            "Article updated successfully",
            "Failed to update article",
        ),
    }
}

/// Returns the article and whether anything was written.
fn try_update_article(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
    input: &ArticleUpdateInput,
) -> Result<(ArticleRecord, bool), ActionError> {
    let article = owned_article(&state.db, user, article_id)?;
    let title = validation::article_title(input.title.as_deref())?;
    let text = validation::article_text(&input.text)?;

    let title_patch = match title {
        _ if title == article.title.as_deref() => Patch::Absent,
        Some(title) => Patch::Value(title.to_string()),
        None => Patch::Null,
    };
    let text = (text != article.text).then_some(text);

    if title_patch.is_absent() && text.is_none() {
        return Ok((article, false));
    }

    let updated = state
        .db
        .update_article(article_id, title_patch, text)?
        .ok_or_else(|| ActionError::NotFound("Article not found".to_string()))?;
    Ok((updated, true))
}

/// Delete an article with its images, then release their assets.
pub async fn delete_article(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
) -> Outcome<()> {
    let deleted = owned_article(&state.db, user, article_id).and_then(|_| {
        state
            .db
            .delete_article(article_id)?
            .ok_or_else(|| ActionError::NotFound("Article not found".to_string()))
    });

    let result = match deleted {
        Ok((article, released)) => {
            release_assets(state.media.as_ref(), &released.asset_ids).await;
            tracing::debug!(article_id = %article.id, "Deleted article");
            Ok(())
        }
        Err(e) => Err(e),
    };
    Outcome::settle(result, "Article deleted successfully", "Failed to delete article")
}

/// Apply a client-side permutation to the articles of a post, all or nothing.
pub async fn reorder_articles(
    state: &AppState,
    user: &CurrentUser,
    post_id: &str,
    updates: &[IndexUpdate],
) -> Outcome<Vec<ArticleRecord>> {
    let result = owned_post(&state.db, user, post_id)
        .and_then(|_| Ok(state.db.reorder_articles(post_id, updates)?));
    Outcome::settle(result, "Articles reordered successfully", "Failed to reorder articles")
}
