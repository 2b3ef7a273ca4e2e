use chrono::Utc;
use redb::WriteTransaction;

use super::db::{
    get_record, index_add, index_remove, index_take, put_record, read_index, read_record,
    take_record, Database, DatabaseError,
};
use super::models::{
    ArticleRecord, ArticleWithImages, ImageRecord, PostRecord, PostWithArticles, ReleasedAssets,
    UserRecord,
};
use super::ordering::sort_by_index;
use super::tables::*;

impl Database {
    // ========================================================================
    // Post operations
    // ========================================================================

    /// Insert a post owned by `user_id`.
    pub fn create_post(&self, user_id: &str, title: &str) -> Result<PostRecord, DatabaseError> {
        let write_txn = self.begin_write()?;

        if get_record::<UserRecord>(&write_txn, USERS, user_id)?.is_none() {
            write_txn.abort()?;
            return Err(DatabaseError::not_found("user", user_id));
        }

        let now = Utc::now();
        let post = PostRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            banner_url: None,
            banner_asset_id: None,
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        put_record(&write_txn, POSTS, &post.id, &post)?;
        index_add(&write_txn, USER_POSTS, user_id, &post.id)?;

        write_txn.commit()?;
        Ok(post)
    }

    /// Get a post by its UUID
    pub fn get_post(&self, id: &str) -> Result<Option<PostRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        read_record(&read_txn, POSTS, id)
    }

    /// Get a post with its articles, each with its images, all ordered by index.
    pub fn get_post_with_articles(
        &self,
        id: &str,
    ) -> Result<Option<PostWithArticles>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let Some(post) = read_record::<PostRecord>(&read_txn, POSTS, id)? else {
            return Ok(None);
        };

        let mut articles = Vec::new();
        for article_id in read_index(&read_txn, POST_ARTICLES, id)? {
            if let Some(article) = read_record::<ArticleRecord>(&read_txn, ARTICLES, &article_id)? {
                articles.push(article);
            }
        }
        sort_by_index(&mut articles);

        let mut with_images = Vec::with_capacity(articles.len());
        for article in articles {
            let mut images = Vec::new();
            for image_id in read_index(&read_txn, ARTICLE_IMAGES, &article.id)? {
                if let Some(image) = read_record::<ImageRecord>(&read_txn, IMAGES, &image_id)? {
                    images.push(image);
                }
            }
            sort_by_index(&mut images);
            with_images.push(ArticleWithImages { article, images });
        }

        Ok(Some(PostWithArticles {
            post,
            articles: with_images,
        }))
    }

    /// All posts owned by a user, oldest `updated_at` first.
    pub fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<PostRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let mut posts = Vec::new();
        for post_id in read_index(&read_txn, USER_POSTS, user_id)? {
            if let Some(post) = read_record::<PostRecord>(&read_txn, POSTS, &post_id)? {
                posts.push(post);
            }
        }
        posts.sort_by_key(|p| p.updated_at);

        Ok(posts)
    }

    /// Update a post's title and/or banner. Returns `None` if the post does not exist.
    pub fn update_post(
        &self,
        id: &str,
        title: Option<&str>,
        banner: Option<(&str, &str)>,
    ) -> Result<Option<PostRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(mut post) = get_record::<PostRecord>(&write_txn, POSTS, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        if let Some(title) = title {
            post.title = title.to_string();
        }
        if let Some((url, asset_id)) = banner {
            post.banner_url = Some(url.to_string());
            post.banner_asset_id = Some(asset_id.to_string());
        }
        post.updated_at = Utc::now();

        put_record(&write_txn, POSTS, id, &post)?;

        write_txn.commit()?;
        Ok(Some(post))
    }

    /// Delete a post with its articles and their images.
    pub fn delete_post(
        &self,
        id: &str,
    ) -> Result<Option<(PostRecord, ReleasedAssets)>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = Self::delete_post_in(&write_txn, id)?;
        write_txn.commit()?;
        Ok(deleted)
    }

    pub(super) fn delete_post_in(
        txn: &WriteTransaction,
        id: &str,
    ) -> Result<Option<(PostRecord, ReleasedAssets)>, DatabaseError> {
        let Some(post) = take_record::<PostRecord>(txn, POSTS, id)? else {
            return Ok(None);
        };

        index_remove(txn, USER_POSTS, &post.user_id, id)?;

        let mut released = ReleasedAssets::default();
        if let Some(ref banner_asset_id) = post.banner_asset_id {
            released.push(banner_asset_id.as_str());
        }

        for article_id in index_take(txn, POST_ARTICLES, id)? {
            if let Some((_, assets)) = Self::delete_article_in(txn, &article_id)? {
                released.extend(assets);
            }
        }

        Ok(Some((post, released)))
    }
}
