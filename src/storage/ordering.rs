//! Batch re-indexing of sibling groups (articles of a post, images of an article).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::db::{get_record, put_record, BytesTable, Database, DatabaseError};
use super::models::{ArticleRecord, ImageRecord, IndexUpdate};

/// A record that lives in an ordered sibling group.
pub trait Ordered: Serialize + DeserializeOwned {
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn index(&self) -> i32;
    fn parent_id(&self) -> Option<&str>;
    fn set_index(&mut self, index: i32, now: DateTime<Utc>);
}

impl Ordered for ArticleRecord {
    const ENTITY: &'static str = "article";

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> i32 {
        self.index
    }

    fn parent_id(&self) -> Option<&str> {
        Some(&self.post_id)
    }

    fn set_index(&mut self, index: i32, now: DateTime<Utc>) {
        self.index = index;
        self.updated_at = now;
    }
}

impl Ordered for ImageRecord {
    const ENTITY: &'static str = "image";

    fn id(&self) -> &str {
        &self.id
    }

    fn index(&self) -> i32 {
        self.index
    }

    fn parent_id(&self) -> Option<&str> {
        self.article_id.as_deref()
    }

    fn set_index(&mut self, index: i32, now: DateTime<Utc>) {
        self.index = index;
        self.updated_at = now;
    }
}

/// Sort siblings by ascending index. The sort is stable, so equal indices keep
/// the order in which the parent index lists them.
pub fn sort_by_index<T: Ordered>(records: &mut [T]) {
    records.sort_by_key(|r| r.index());
}

impl Database {
    /// Apply `{id, index}` pairs to one sibling group inside a single write
    /// transaction. Any id that is missing or belongs to another parent aborts
    /// the whole batch. Indices are taken verbatim: duplicates and gaps are allowed.
    pub(super) fn reorder_siblings<T: Ordered>(
        &self,
        table: BytesTable,
        parent_id: &str,
        updates: &[IndexUpdate],
    ) -> Result<Vec<T>, DatabaseError> {
        let write_txn = self.begin_write()?;
        let now = Utc::now();
        let mut touched: HashMap<String, T> = HashMap::with_capacity(updates.len());

        for update in updates {
            let existing: Option<T> = get_record(&write_txn, table, &update.id)?;
            let mut record = match existing {
                Some(record) if record.parent_id() == Some(parent_id) => record,
                _ => {
                    write_txn.abort()?;
                    return Err(DatabaseError::not_found(T::ENTITY, update.id.as_str()));
                }
            };
            record.set_index(update.index, now);
            put_record(&write_txn, table, &update.id, &record)?;
            touched.insert(record.id().to_string(), record);
        }

        write_txn.commit()?;

        let mut records: Vec<T> = touched.into_values().collect();
        sort_by_index(&mut records);
        Ok(records)
    }
}
