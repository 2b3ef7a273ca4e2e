use chrono::{Duration, Utc};
use redb::WriteTransaction;

use super::db::{
    get_index, get_record, index_add, index_remove, index_take, put_record, read_index, read_record,
    take_record, Database, DatabaseError,
};
use super::models::SessionRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session under the hash of its token. The user's expired
    /// sessions are pruned in the same transaction.
    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: &str,
        ttl: Duration,
    ) -> Result<SessionRecord, DatabaseError> {
        let now = Utc::now();
        let session = SessionRecord {
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };

        let write_txn = self.begin_write()?;
        let pruned = Self::prune_expired_sessions_in(&write_txn, user_id)?;
        put_record(&write_txn, SESSIONS, token_hash, &session)?;
        index_add(&write_txn, USER_SESSIONS, user_id, token_hash)?;
        write_txn.commit()?;

        if pruned > 0 {
            tracing::debug!(user_id, pruned, "Pruned expired sessions");
        }
        Ok(session)
    }

    /// Get a session by token hash, whether or not it has expired.
    pub fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        read_record(&read_txn, SESSIONS, token_hash)
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = take_record::<SessionRecord>(&write_txn, SESSIONS, token_hash)?;
        if let Some(ref session) = removed {
            index_remove(&write_txn, USER_SESSIONS, &session.user_id, token_hash)?;
        }
        write_txn.commit()?;
        Ok(removed.is_some())
    }

    /// Number of live and expired sessions held for a user.
    pub fn count_user_sessions(&self, user_id: &str) -> Result<usize, DatabaseError> {
        let read_txn = self.begin_read()?;
        Ok(read_index(&read_txn, USER_SESSIONS, user_id)?.len())
    }

    fn prune_expired_sessions_in(
        txn: &WriteTransaction,
        user_id: &str,
    ) -> Result<usize, DatabaseError> {
        let mut pruned = 0;
        for hash in get_index(txn, USER_SESSIONS, user_id)? {
            let expired = get_record::<SessionRecord>(txn, SESSIONS, &hash)?
                .map_or(true, |session| session.is_expired());
            if expired {
                take_record::<SessionRecord>(txn, SESSIONS, &hash)?;
                index_remove(txn, USER_SESSIONS, user_id, &hash)?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    pub(super) fn delete_user_sessions_in(
        txn: &WriteTransaction,
        user_id: &str,
    ) -> Result<u64, DatabaseError> {
        let hashes = index_take(txn, USER_SESSIONS, user_id)?;
        for hash in &hashes {
            take_record::<SessionRecord>(txn, SESSIONS, hash)?;
        }
        Ok(hashes.len() as u64)
    }
}
