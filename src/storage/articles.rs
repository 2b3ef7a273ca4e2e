use chrono::Utc;
use redb::WriteTransaction;

use super::db::{
    get_record, index_add, index_remove, index_take, put_record, read_index, read_record,
    take_record, Database, DatabaseError,
};
use super::models::{ArticleRecord, IndexUpdate, Patch, PostRecord, ReleasedAssets};
use super::ordering::sort_by_index;
use super::tables::*;

impl Database {
    // ========================================================================
    // Article operations
    // ========================================================================

    /// Insert an article under `post_id` at the given index.
    pub fn create_article(
        &self,
        post_id: &str,
        title: Option<&str>,
        text: &str,
        index: i32,
    ) -> Result<ArticleRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        if get_record::<PostRecord>(&write_txn, POSTS, post_id)?.is_none() {
            write_txn.abort()?;
            return Err(DatabaseError::not_found("post", post_id));
        }

        let now = Utc::now();
        let article = ArticleRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.map(|t| t.to_string()),
            text: text.to_string(),
            index,
            post_id: post_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        put_record(&write_txn, ARTICLES, &article.id, &article)?;
        index_add(&write_txn, POST_ARTICLES, post_id, &article.id)?;

        write_txn.commit()?;
        Ok(article)
    }

    /// Get an article by its UUID
    pub fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        read_record(&read_txn, ARTICLES, id)
    }

    /// Articles of a post ordered by ascending index
    pub fn list_articles_by_post(&self, post_id: &str) -> Result<Vec<ArticleRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let mut articles = Vec::new();
        for article_id in read_index(&read_txn, POST_ARTICLES, post_id)? {
            if let Some(article) = read_record::<ArticleRecord>(&read_txn, ARTICLES, &article_id)? {
                articles.push(article);
            }
        }
        sort_by_index(&mut articles);

        Ok(articles)
    }

    /// Update an article's title and/or text. Returns `None` if it does not exist.
    pub fn update_article(
        &self,
        id: &str,
        title: Patch<String>,
        text: Option<&str>,
    ) -> Result<Option<ArticleRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(mut article) = get_record::<ArticleRecord>(&write_txn, ARTICLES, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        title.apply_to(&mut article.title);
        if let Some(text) = text {
            article.text = text.to_string();
        }
        article.updated_at = Utc::now();

        put_record(&write_txn, ARTICLES, id, &article)?;

        write_txn.commit()?;
        Ok(Some(article))
    }

    /// Delete an article and its images.
    pub fn delete_article(
        &self,
        id: &str,
    ) -> Result<Option<(ArticleRecord, ReleasedAssets)>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = Self::delete_article_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(deleted)
    }

    pub(super) fn delete_article_in(
        txn: &WriteTransaction,
        id: &str,
    ) -> Result<Option<(ArticleRecord, ReleasedAssets)>, DatabaseError> {
        let Some(article) = take_record::<ArticleRecord>(txn, ARTICLES, id)? else {
            return Ok(None);
        };

        index_remove(txn, POST_ARTICLES, &article.post_id, id)?;

        let mut released = ReleasedAssets::default();
        for image_id in index_take(txn, ARTICLE_IMAGES, id)? {
            if let Some(image) = Self::delete_image_in(txn, &image_id)? {
                released.push(image.asset_id);
            }
        }

        Ok(Some((article, released)))
    }

    /// Re-index the articles of a post in one transaction; all or nothing.
    pub fn reorder_articles(
        &self,
        post_id: &str,
        updates: &[IndexUpdate],
    ) -> Result<Vec<ArticleRecord>, DatabaseError> {
        self.reorder_siblings(ARTICLES, post_id, updates)
    }
}
