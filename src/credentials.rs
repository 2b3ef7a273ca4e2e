//! Password hashing, API keys and session tokens.
//!
//! Passwords are hashed with Argon2id and a random salt (PHC string format).
//! API keys and session tokens are 32 random bytes, hex encoded behind a short
//! prefix; only their SHA-256 digest is ever stored.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;

use crate::storage::models::UserRecord;
use crate::storage::{Database, DatabaseError};

pub const API_KEY_PREFIX: &str = "sk_";
pub const SESSION_TOKEN_PREFIX: &str = "ss_";

const TOKEN_BYTES: usize = 32;
const SALT_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Password hashing error: {0}")]
    Hash(String),
    #[error("No unused API key after {0} attempts")]
    KeyExhausted(u32),
    #[error("System random number generator failed")]
    Random,
}

/// A freshly generated secret. `raw` is handed to the client once; `hashed`
/// is what gets persisted.
#[derive(Debug, Clone)]
pub struct IssuedKey {
    pub raw: String,
    pub hashed: String,
}

impl IssuedKey {
    pub fn generate(prefix: &str) -> Result<Self, CredentialError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| CredentialError::Random)?;

        let raw = format!("{prefix}{}", hex::encode(bytes));
        let hashed = hash_key(&raw);
        Ok(Self { raw, hashed })
    }
}

/// Hex SHA-256 of a raw key or token.
pub fn hash_key(raw: &str) -> String {
    hex::encode(digest(&SHA256, raw.as_bytes()))
}

pub fn hash_password(plain: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_BYTES];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CredentialError::Random)?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| CredentialError::Hash(e.to_string()))?;

    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// `false` for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Generate an API key whose hash is not yet assigned to any user,
/// giving up after `max_attempts` collisions.
pub fn issue_api_key(db: &Database, max_attempts: u32) -> Result<IssuedKey, CredentialError> {
    for attempt in 1..=max_attempts {
        let key = IssuedKey::generate(API_KEY_PREFIX)?;
        if !db.api_key_hash_exists(&key.hashed)? {
            return Ok(key);
        }
        tracing::warn!(attempt, "API key hash collision, regenerating");
    }
    Err(CredentialError::KeyExhausted(max_attempts))
}

/// Resolve the owner of a presented API key. Malformed and unknown keys are
/// indistinguishable: both yield `None`.
pub fn validate_api_key(
    db: &Database,
    presented: &str,
) -> Result<Option<UserRecord>, DatabaseError> {
    db.get_user_by_api_key_hash(&hash_key(presented))
}

/// Extract the key from `Bearer <key>`, optionally wrapped in double quotes.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let unquoted = header.strip_prefix('"').unwrap_or(header);
    let key = unquoted.strip_prefix("Bearer ")?;
    let key = key.strip_suffix('"').unwrap_or(key);
    (!key.is_empty()).then_some(key)
}
