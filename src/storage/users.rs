use chrono::Utc;
use redb::ReadableTable;

use super::db::{
    get_record, index_take, put_record, read_record, take_record, Database, DatabaseError,
};
use super::models::{ReleasedAssets, UserRecord};
use super::tables::*;

/// Fields for a new account. Hashing happens before this reaches storage.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub api_key_hash: &'a str,
}

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Insert a user and its email and API key indexes.
    /// Fails with `Conflict` when the email is already registered.
    pub fn create_user(&self, new_user: &NewUser<'_>) -> Result<UserRecord, DatabaseError> {
        debug_assert!(!new_user.email.is_empty(), "email must not be empty");

        let write_txn = self.begin_write()?;

        let taken = {
            let emails = write_txn.open_table(USER_EMAILS)?;
            let exists = emails.get(new_user.email)?.is_some();
            exists
        };
        if taken {
            write_txn.abort()?;
            return Err(DatabaseError::Conflict(format!(
                "email '{}' is already registered",
                new_user.email
            )));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_user.name.to_string(),
            email: new_user.email.to_string(),
            password_hash: new_user.password_hash.to_string(),
            api_key_hash: new_user.api_key_hash.to_string(),
            created_at: now,
            updated_at: now,
        };

        put_record(&write_txn, USERS, &user.id, &user)?;
        {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            emails.insert(user.email.as_str(), user.id.as_str())?;

            let mut keys = write_txn.open_table(USER_API_KEYS)?;
            keys.insert(user.api_key_hash.as_str(), user.id.as_str())?;
        }

        write_txn.commit()?;
        Ok(user)
    }

    /// Get a user by UUID
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        read_record(&read_txn, USERS, id)
    }

    /// Get a user by email (resolves email -> uuid -> user)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;

        let id = match emails.get(email)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        read_record(&read_txn, USERS, &id)
    }

    /// Get a user by the hash of their API key
    pub fn get_user_by_api_key_hash(
        &self,
        key_hash: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let keys = read_txn.open_table(USER_API_KEYS)?;

        let id = match keys.get(key_hash)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        read_record(&read_txn, USERS, &id)
    }

    /// Check if an API key hash is already assigned to some user
    pub fn api_key_hash_exists(&self, key_hash: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let keys = read_txn.open_table(USER_API_KEYS)?;
        Ok(keys.get(key_hash)?.is_some())
    }

    /// Update a user's name and/or email. Returns `None` if the user does not exist.
    pub fn update_user_profile(
        &self,
        id: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(mut user) = get_record::<UserRecord>(&write_txn, USERS, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        if let Some(name) = name {
            user.name = name.to_string();
        }

        if let Some(new_email) = email.filter(|e| *e != user.email) {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            let taken = emails.get(new_email)?.is_some();
            if taken {
                drop(emails);
                write_txn.abort()?;
                return Err(DatabaseError::Conflict(format!(
                    "email '{new_email}' is already registered"
                )));
            }
            emails.remove(user.email.as_str())?;
            emails.insert(new_email, id)?;
            user.email = new_email.to_string();
        }

        user.updated_at = Utc::now();
        put_record(&write_txn, USERS, id, &user)?;

        write_txn.commit()?;
        Ok(Some(user))
    }

    /// Replace a user's password hash. Returns `None` if the user does not exist.
    pub fn update_user_password(
        &self,
        id: &str,
        password_hash: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(mut user) = get_record::<UserRecord>(&write_txn, USERS, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        put_record(&write_txn, USERS, id, &user)?;

        write_txn.commit()?;
        Ok(Some(user))
    }

    /// Swap a user's API key hash, invalidating the previous key.
    pub fn rotate_user_api_key(
        &self,
        id: &str,
        api_key_hash: &str,
    ) -> Result<Option<UserRecord>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(mut user) = get_record::<UserRecord>(&write_txn, USERS, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        {
            let mut keys = write_txn.open_table(USER_API_KEYS)?;
            keys.remove(user.api_key_hash.as_str())?;
            keys.insert(api_key_hash, id)?;
        }

        user.api_key_hash = api_key_hash.to_string();
        user.updated_at = Utc::now();
        put_record(&write_txn, USERS, id, &user)?;

        write_txn.commit()?;
        Ok(Some(user))
    }

    /// Delete a user and everything it owns: posts (with their articles and
    /// images), loose images and sessions. Returns the asset ids to release,
    /// or `None` if the user does not exist.
    pub fn delete_user(&self, id: &str) -> Result<Option<ReleasedAssets>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let Some(user) = take_record::<UserRecord>(&write_txn, USERS, id)? else {
            write_txn.abort()?;
            return Ok(None);
        };

        {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            emails.remove(user.email.as_str())?;

            let mut keys = write_txn.open_table(USER_API_KEYS)?;
            keys.remove(user.api_key_hash.as_str())?;
        }

        let mut released = ReleasedAssets::default();

        for post_id in index_take(&write_txn, USER_POSTS, id)? {
            if let Some((_, assets)) = Self::delete_post_in(&write_txn, &post_id)? {
                released.extend(assets);
            }
        }

        // Images outside the user's posts (loose uploads)
        for image_id in index_take(&write_txn, USER_IMAGES, id)? {
            if let Some(image) = Self::delete_image_in(&write_txn, &image_id)? {
                released.push(image.asset_id);
            }
        }

        Self::delete_user_sessions_in(&write_txn, id)?;

        write_txn.commit()?;
        Ok(Some(released))
    }
}
