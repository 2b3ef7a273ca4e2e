mod cloudinary;
mod local;

pub use cloudinary::{CloudinaryStore, UPLOAD_TRANSFORMATION};
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Where a stored asset can be fetched from, and the id needed to delete it later.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedAsset {
    pub url: String,
    pub asset_id: String,
}

/// Abstraction over image hosting backends.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `data` under `folder`. `file_name` is the client's original name,
    /// used only as a type hint.
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        file_name: &str,
    ) -> Result<UploadedAsset, MediaError>;

    /// Delete an asset. An asset that is already gone counts as deleted.
    async fn remove(&self, asset_id: &str) -> Result<(), MediaError>;

    async fn get(&self, asset_id: &str) -> Result<Bytes, MediaError>;
}
