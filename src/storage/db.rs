use redb::{
    Database as RedbDatabase, ReadTransaction, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

/// Shape shared by every record table and every id-list index.
pub(crate) type BytesTable = TableDefinition<'static, &'static str, &'static [u8]>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("blog-cms.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
            let _ = write_txn.open_table(USER_API_KEYS)?;
            let _ = write_txn.open_table(POSTS)?;
            let _ = write_txn.open_table(ARTICLES)?;
            let _ = write_txn.open_table(IMAGES)?;
            let _ = write_txn.open_table(SESSIONS)?;
            let _ = write_txn.open_table(USER_POSTS)?;
            let _ = write_txn.open_table(USER_IMAGES)?;
            let _ = write_txn.open_table(USER_SESSIONS)?;
            let _ = write_txn.open_table(POST_ARTICLES)?;
            let _ = write_txn.open_table(ARTICLE_IMAGES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }
}

// ============================================================================
// Record helpers (msgpack values keyed by uuid)
// ============================================================================

pub(crate) fn read_record<T: DeserializeOwned>(
    txn: &ReadTransaction,
    table: BytesTable,
    id: &str,
) -> Result<Option<T>, DatabaseError> {
    let table = txn.open_table(table)?;
    match table.get(id)? {
        Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
        None => Ok(None),
    }
}

pub(crate) fn get_record<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: BytesTable,
    id: &str,
) -> Result<Option<T>, DatabaseError> {
    let table = txn.open_table(table)?;
    let result = match table.get(id)? {
        Some(data) => Some(rmp_serde::from_slice(data.value())?),
        None => None,
    };
    Ok(result)
}

pub(crate) fn put_record<T: Serialize>(
    txn: &WriteTransaction,
    table: BytesTable,
    id: &str,
    record: &T,
) -> Result<(), DatabaseError> {
    let data = rmp_serde::to_vec_named(record)?;
    let mut table = txn.open_table(table)?;
    table.insert(id, data.as_slice())?;
    Ok(())
}

/// Remove a record, returning what was stored.
pub(crate) fn take_record<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: BytesTable,
    id: &str,
) -> Result<Option<T>, DatabaseError> {
    let mut table = txn.open_table(table)?;
    let result = match table.remove(id)? {
        Some(data) => Some(rmp_serde::from_slice(data.value())?),
        None => None,
    };
    Ok(result)
}

// ============================================================================
// Id-list index helpers (owner/parent uuid -> msgpack Vec of child uuids)
// ============================================================================

pub(crate) fn read_index(
    txn: &ReadTransaction,
    table: BytesTable,
    key: &str,
) -> Result<Vec<String>, DatabaseError> {
    let table = txn.open_table(table)?;
    match table.get(key)? {
        Some(data) => Ok(rmp_serde::from_slice(data.value())?),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn get_index(
    txn: &WriteTransaction,
    table: BytesTable,
    key: &str,
) -> Result<Vec<String>, DatabaseError> {
    let table = txn.open_table(table)?;
    let ids = match table.get(key)? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => Vec::new(),
    };
    Ok(ids)
}

pub(crate) fn index_add(
    txn: &WriteTransaction,
    table: BytesTable,
    key: &str,
    id: &str,
) -> Result<(), DatabaseError> {
    let mut ids = get_index(txn, table, key)?;
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
        let data = rmp_serde::to_vec_named(&ids)?;
        let mut table = txn.open_table(table)?;
        table.insert(key, data.as_slice())?;
    }
    Ok(())
}

pub(crate) fn index_remove(
    txn: &WriteTransaction,
    table: BytesTable,
    key: &str,
    id: &str,
) -> Result<(), DatabaseError> {
    let mut ids = get_index(txn, table, key)?;
    ids.retain(|existing| existing != id);
    let mut table = txn.open_table(table)?;
    if ids.is_empty() {
        table.remove(key)?;
    } else {
        let data = rmp_serde::to_vec_named(&ids)?;
        table.insert(key, data.as_slice())?;
    }
    Ok(())
}

/// Remove an index entry entirely, returning the ids it held.
pub(crate) fn index_take(
    txn: &WriteTransaction,
    table: BytesTable,
    key: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut table = txn.open_table(table)?;
    let ids = match table.remove(key)? {
        Some(data) => rmp_serde::from_slice(data.value())?,
        None => Vec::new(),
    };
    Ok(ids)
}
