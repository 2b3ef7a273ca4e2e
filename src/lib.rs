//! blog-cms - A blog content-management API
//!
//! This crate provides authenticated post, article and image management with:
//! - Ordered articles and images, re-indexed transactionally
//! - Swappable media backends (local filesystem, Cloudinary)
//! - redb embedded database for all records (ACID, MVCC, crash-safe)
//! - Cookie sessions for the application API and a bearer-token read API

pub mod actions;
pub mod api;
pub mod config;
pub mod credentials;
pub mod media;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub media: Arc<dyn media::MediaStore>,
}
