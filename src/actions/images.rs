use serde::Serialize;

use super::validation::ImageUpload;
use super::{owned_article, owned_image, release_assets, ActionError, Outcome};
use crate::media::UploadedAsset;
use crate::session::CurrentUser;
use crate::storage::models::{ImageRecord, ImageTotals, IndexUpdate};
use crate::storage::NewImage;
use crate::AppState;

/// A user's whole image library.
#[derive(Debug, Serialize)]
pub struct UserImages {
    pub images: Vec<ImageRecord>,
    #[serde(flatten)]
    pub totals: ImageTotals,
}

fn image_not_found() -> ActionError {
    ActionError::NotFound("Image not found".to_string())
}

pub async fn list_article_images(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
) -> Outcome<Vec<ImageRecord>> {
    let result = owned_article(&state.db, user, article_id)
        .and_then(|_| Ok(state.db.list_images_by_article(article_id)?));
    Outcome::settle(result, "Images loaded", "Failed to load images")
}

pub async fn list_user_images(state: &AppState, user: &CurrentUser) -> Outcome<UserImages> {
    let result = state
        .db
        .list_images_by_user(user.id())
        .map(|(images, totals)| UserImages { images, totals })
        .map_err(ActionError::from);
    Outcome::settle(result, "Images loaded", "Failed to load images")
}

/// Upload an image into an article. Without an explicit index it goes last.
pub async fn create_article_image(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
    upload: &ImageUpload,
    index: Option<i32>,
) -> Outcome<ImageRecord> {
    let result = match owned_article(&state.db, user, article_id) {
        Ok(article) => {
            let folder = format!("articles/{}/images", article.id);
            store_image(state, user, Some(article.id.as_str()), &folder, upload, index).await
        }
        Err(e) => Err(e),
    };
    Outcome::settle(result, "Image created successfully", "Failed to create image")
}

/// Upload a loose image that belongs to no article.
pub async fn create_user_image(
    state: &AppState,
    user: &CurrentUser,
    upload: &ImageUpload,
    index: Option<i32>,
) -> Outcome<ImageRecord> {
    let folder = format!("users/{}/images", user.id());
    let result = store_image(state, user, None, &folder, upload, index).await;
    Outcome::settle(result, "Image created successfully", "Failed to create image")
}

/// Upload first, then insert the row. A row that cannot be written takes
/// its freshly uploaded asset with it.
async fn store_image(
    state: &AppState,
    user: &CurrentUser,
    article_id: Option<&str>,
    folder: &str,
    upload: &ImageUpload,
    index: Option<i32>,
) -> Result<ImageRecord, ActionError> {
    upload.validate(state.config.max_image_size)?;

    let index = match (index, article_id) {
        (Some(index), _) => index,
        (None, Some(article_id)) => state.db.list_images_by_article(article_id)?.len() as i32,
        (None, None) => state.db.list_images_by_user(user.id())?.1.total_images as i32,
    };

    let uploaded = state
        .media
        .upload(upload.data.clone(), folder, &upload.file_name)
        .await?;

    let inserted = state.db.create_image(&NewImage {
        url: &uploaded.url,
        asset_id: &uploaded.asset_id,
        index,
        article_id,
        user_id: user.id(),
        size: upload.size(),
        original_name: &upload.file_name,
    });

    match inserted {
        Ok(image) => {
            tracing::debug!(image_id = %image.id, asset_id = %image.asset_id, "Stored image");
            Ok(image)
        }
        Err(e) => {
            compensate(state, uploaded).await;
            Err(e.into())
        }
    }
}

async fn compensate(state: &AppState, uploaded: UploadedAsset) {
    tracing::warn!(asset_id = %uploaded.asset_id, "Removing asset whose row was not written");
    release_assets(state.media.as_ref(), &[uploaded.asset_id]).await;
}

/// Swap the file behind an image, keeping its id, index and article.
pub async fn replace_image(
    state: &AppState,
    user: &CurrentUser,
    image_id: &str,
    upload: &ImageUpload,
) -> Outcome<ImageRecord> {
    let result = try_replace_image(state, user, image_id, upload).await;
    Outcome::settle(result, "Image updated successfully", "Failed to update image")
}

async fn try_replace_image(
    state: &AppState,
    user: &CurrentUser,
    image_id: &str,
    upload: &ImageUpload,
) -> Result<ImageRecord, ActionError> {
    let image = owned_image(&state.db, user, image_id)?;
    upload.validate(state.config.max_image_size)?;

    let folder = match image.article_id {
        Some(ref article_id) => format!("articles/{article_id}/images"),
        None => format!("users/{}/images", image.user_id),
    };
    let uploaded = state
        .media
        .upload(upload.data.clone(), &folder, &upload.file_name)
        .await?;

    let written = state.db.replace_image_asset(
        image_id,
        &uploaded.url,
        &uploaded.asset_id,
        upload.size(),
        &upload.file_name,
    );

    match written {
        Ok(Some((previous, updated))) => {
            release_assets(state.media.as_ref(), &[previous.asset_id]).await;
            Ok(updated)
        }
        Ok(None) => {
            compensate(state, uploaded).await;
            Err(image_not_found())
        }
        Err(e) => {
            compensate(state, uploaded).await;
            Err(e.into())
        }
    }
}

/// Delete the row, then its asset.
pub async fn delete_image(state: &AppState, user: &CurrentUser, image_id: &str) -> Outcome<()> {
    let deleted = owned_image(&state.db, user, image_id)
        .and_then(|_| state.db.delete_image(image_id)?.ok_or_else(image_not_found));

    let result = match deleted {
        Ok(image) => {
            release_assets(state.media.as_ref(), &[image.asset_id]).await;
            Ok(())
        }
        Err(e) => Err(e),
    };
    Outcome::settle(result, "Image deleted successfully", "Failed to delete image")
}

pub async fn reorder_images(
    state: &AppState,
    user: &CurrentUser,
    article_id: &str,
    updates: &[IndexUpdate],
) -> Outcome<Vec<ImageRecord>> {
    let result = owned_article(&state.db, user, article_id)
        .and_then(|_| Ok(state.db.reorder_images(article_id, updates)?));
    Outcome::settle(result, "Images reordered successfully", "Failed to reorder images")
}
