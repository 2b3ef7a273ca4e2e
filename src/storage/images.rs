use chrono::Utc;
use redb::WriteTransaction;

use super::db::{
    get_record, index_add, index_remove, put_record, read_index, read_record, take_record,
    Database, DatabaseError,
};
use super::models::{ArticleRecord, ImageRecord, ImageTotals, IndexUpdate, UserRecord};
use super::ordering::sort_by_index;
use super::tables::*;

/// Fields for a new image row, filled in after the asset host accepted the upload.
#[derive(Debug, Clone)]
pub struct NewImage<'a> {
    pub url: &'a str,
    pub asset_id: &'a str,
    pub index: i32,
    pub article_id: Option<&'a str>,
    pub user_id: &'a str,
    pub size: u64,
    pub original_name: &'a str,
}

impl Database {
    // ========================================================================
    // Image operations
    // ========================================================================

    /// Insert an image row and maintain the owner and article indexes.
    pub fn create_image(&self, new_image: &NewImage<'_>) -> Result<ImageRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        if get_record::<UserRecord>(&write_txn, USERS, new_image.user_id)?.is_none() {
            write_txn.abort()?;
            return Err(DatabaseError::not_found("user", new_image.user_id));
        }
        if let Some(article_id) = new_image.article_id {
            if get_record::<ArticleRecord>(&write_txn, ARTICLES, article_id)?.is_none() {
                write_txn.abort()?;
                return Err(DatabaseError::not_found("article", article_id));
            }
        }

        let now = Utc::now();
        let image = ImageRecord {
            id: uuid::Uuid::new_v4().to_string(),
            url: new_image.url.to_string(),
            asset_id: new_image.asset_id.to_string(),
            index: new_image.index,
            article_id: new_image.article_id.map(|a| a.to_string()),
            user_id: new_image.user_id.to_string(),
            size: new_image.size,
            original_name: new_image.original_name.to_string(),
            created_at: now,
            updated_at: now,
        };

        put_record(&write_txn, IMAGES, &image.id, &image)?;
        index_add(&write_txn, USER_IMAGES, &image.user_id, &image.id)?;
        if let Some(ref article_id) = image.article_id {
            index_add(&write_txn, ARTICLE_IMAGES, article_id, &image.id)?;
        }

        write_txn.commit()?;
        Ok(image)
    }

    /// Get an image by its UUID
    pub fn get_image(&self, id: &str) -> Result<Option<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        read_record(&read_txn, IMAGES, id)
    }

    /// Images of an article ordered by ascending index
    pub fn list_images_by_article(
        &self,
        article_id: &str,
    ) -> Result<Vec<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let mut images = Vec::new();
        for image_id in read_index(&read_txn, ARTICLE_IMAGES, article_id)? {
            if let Some(image) = read_record::<ImageRecord>(&read_txn, IMAGES, &image_id)? {
                images.push(image);
            }
        }
        sort_by_index(&mut images);

        Ok(images)
    }

    /// Every image a user owns, oldest first, with count and total size.
    pub fn list_images_by_user(
        &self,
        user_id: &str,
    ) -> Result<(Vec<ImageRecord>, ImageTotals), DatabaseError> {
        let read_txn = self.begin_read()?;

        let mut images = Vec::new();
        for image_id in read_index(&read_txn, USER_IMAGES, user_id)? {
            if let Some(image) = read_record::<ImageRecord>(&read_txn, IMAGES, &image_id)? {
                images.push(image);
            }
        }
        images.sort_by_key(|i| i.created_at);

        let totals = ImageTotals {
            total_images: images.len() as u64,
            total_size: images.iter().map(|i| i.size).sum(),
        };

        Ok((images, totals))
    }

    /// Point an image row at a newly uploaded asset. Returns the row as it was
    /// before the change (so the caller can release the old asset) and the
    /// updated row, or `None` if the image does not exist.
    pub fn replace_image_asset(
        &self,
        id: &str,
        url: &str,
        asset_id: &str,
        size: u64,
        original_name: &str,
    ) -> Result<Option<(ImageRecord, ImageRecord)>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(previous) = get_record::<ImageRecord>(&write_txn, IMAGES, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        let mut image = previous.clone();
        image.url = url.to_string();
        image.asset_id = asset_id.to_string();
        image.size = size;
        image.original_name = original_name.to_string();
        image.updated_at = Utc::now();

        put_record(&write_txn, IMAGES, id, &image)?;

        write_txn.commit()?;
        Ok(Some((previous, image)))
    }

    /// Delete an image row, returning it so the caller can release its asset.
    pub fn delete_image(&self, id: &str) -> Result<Option<ImageRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = Self::delete_image_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(deleted)
    }

    pub(super) fn delete_image_in(
        txn: &WriteTransaction,
        id: &str,
    ) -> Result<Option<ImageRecord>, DatabaseError> {
        let Some(image) = take_record::<ImageRecord>(txn, IMAGES, id)? else {
            return Ok(None);
        };

        index_remove(txn, USER_IMAGES, &image.user_id, id)?;
        if let Some(ref article_id) = image.article_id {
            index_remove(txn, ARTICLE_IMAGES, article_id, id)?;
        }

        Ok(Some(image))
    }

    /// Re-index the images of an article in one transaction; all or nothing.
    pub fn reorder_images(
        &self,
        article_id: &str,
        updates: &[IndexUpdate],
    ) -> Result<Vec<ImageRecord>, DatabaseError> {
        self.reorder_siblings(IMAGES, article_id, updates)
    }
}
