//! Server-side operations behind the application API.
//!
//! Every action resolves to an [`Outcome`]: failures are logged here and turned
//! into a fixed user-facing message, so nothing below this layer reaches the
//! client as an error.

pub mod articles;
pub mod auth;
pub mod images;
pub mod posts;
pub mod settings;
pub mod validation;


use serde::Serialize;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::media::{MediaError, MediaStore};
use crate::session::CurrentUser;
use crate::storage::models::{ArticleRecord, ImageRecord, PostRecord};
use crate::storage::{Database, DatabaseError};

/// Failure categories surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    Conflict,
    ExternalService,
    NotFound,
    Unknown,
    Validation,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Conflict(String),
    #[error("External service error: {0}")]
    ExternalService(#[from] MediaError),
    #[error("{0}")]
    NotFound(String),
    #[error("Unexpected error: {0}")]
    Unknown(String),
    #[error("{0}")]
    Validation(String),
}

impl ActionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ActionError::Auth(_) => FailureKind::Auth,
            ActionError::Conflict(_) => FailureKind::Conflict,
            ActionError::ExternalService(_) => FailureKind::ExternalService,
            ActionError::NotFound(_) => FailureKind::NotFound,
            ActionError::Unknown(_) => FailureKind::Unknown,
            ActionError::Validation(_) => FailureKind::Validation,
        }
    }

    /// The message a client may see. Internal detail is replaced by `fallback`.
    fn public_message(&self, fallback: &str) -> String {
        match self {
            ActionError::Auth(msg)
            | ActionError::Conflict(msg)
            | ActionError::NotFound(msg)
            | ActionError::Validation(msg) => msg.clone(),
            ActionError::ExternalService(_) | ActionError::Unknown(_) => fallback.to_string(),
        }
    }
}

impl From<DatabaseError> for ActionError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity, .. } => ActionError::NotFound(not_found_message(entity)),
            DatabaseError::Conflict(_) => {
                ActionError::Conflict("This email is already registered".to_string())
            }
            other => ActionError::Unknown(other.to_string()),
        }
    }
}

impl From<CredentialError> for ActionError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Database(e) => e.into(),
            other => ActionError::Unknown(other.to_string()),
        }
    }
}

fn not_found_message(entity: &str) -> String {
    match entity {
        "post" => "Post not found",
        "article" => "Article not found",
        "image" => "Image not found",
        "user" => "User not found",
        _ => "Not found",
    }
    .to_string()
}

// ============================================================================
// Outcome envelope
// ============================================================================

/// Uniform result of an action: `{success, message, data?}`.
#[derive(Debug, Serialize)]
pub struct Outcome<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl<T: Serialize> Outcome<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            failure: None,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            failure: Some(kind),
        }
    }

    /// Settle an action result: log the cause of a failure and keep only a
    /// client-safe message.
    pub fn settle(
        result: Result<T, ActionError>,
        success_message: &str,
        failure_message: &str,
    ) -> Self {
        match result {
            Ok(data) => Self::success(success_message, data),
            Err(e) => {
                match e.kind() {
                    FailureKind::ExternalService | FailureKind::Unknown => {
                        tracing::error!(error = %e, "{failure_message}");
                    }
                    _ => tracing::debug!(error = %e, "{failure_message}"),
                }
                Self::failure(e.kind(), e.public_message(failure_message))
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

// ============================================================================
// Ownership checks
// ============================================================================

/// A post the current user owns. Posts of other users are reported as missing.
pub(crate) fn owned_post(
    db: &Database,
    user: &CurrentUser,
    post_id: &str,
) -> Result<PostRecord, ActionError> {
    match db.get_post(post_id)? {
        Some(post) if post.user_id == user.id() => Ok(post),
        _ => Err(ActionError::NotFound(not_found_message("post"))),
    }
}

/// An article whose post the current user owns.
pub(crate) fn owned_article(
    db: &Database,
    user: &CurrentUser,
    article_id: &str,
) -> Result<ArticleRecord, ActionError> {
    let article = db
        .get_article(article_id)?
        .ok_or_else(|| ActionError::NotFound(not_found_message("article")))?;
    owned_post(db, user, &article.post_id)
        .map_err(|_| ActionError::NotFound(not_found_message("article")))?;
    Ok(article)
}

pub(crate) fn owned_image(
    db: &Database,
    user: &CurrentUser,
    image_id: &str,
) -> Result<ImageRecord, ActionError> {
    match db.get_image(image_id)? {
        Some(image) if image.user_id == user.id() => Ok(image),
        _ => Err(ActionError::NotFound(not_found_message("image"))),
    }
}

// ============================================================================
// Asset clean-up
// ============================================================================

/// Delete assets whose rows are gone. Failures only leave orphans on the
/// host, so they are logged and never fail the action.
pub(crate) async fn release_assets(media: &dyn MediaStore, asset_ids: &[String]) {
    for asset_id in asset_ids {
        if let Err(e) = media.remove(asset_id).await {
            tracing::warn!(asset_id = %asset_id, error = %e, "Failed to delete asset from media host");
        }
    }
}
