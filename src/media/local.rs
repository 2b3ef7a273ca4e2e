use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use super::{MediaError, MediaStore, UploadedAsset};

/// Local filesystem media store for development and testing.
/// Assets are served back by the `/media/*asset_id` route.
pub struct LocalStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P, public_base_url: &str) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve an asset id to a path, refusing anything that escapes the base directory.
    fn asset_path(&self, asset_id: &str) -> Result<PathBuf, MediaError> {
        let relative = Path::new(asset_id);
        let safe = !asset_id.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MediaError::InvalidAssetId(asset_id.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    pub fn url_for(&self, asset_id: &str) -> String {
        format!("{}/media/{asset_id}", self.public_base_url)
    }
}

#[async_trait]
impl MediaStore for LocalStore {
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        file_name: &str,
    ) -> Result<UploadedAsset, MediaError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let folder = folder.trim_matches('/');
        let asset_id = format!("{folder}/{}{extension}", uuid::Uuid::new_v4());

        let path = self.asset_path(&asset_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        Ok(UploadedAsset {
            url: self.url_for(&asset_id),
            asset_id,
        })
    }

    async fn remove(&self, asset_id: &str) -> Result<(), MediaError> {
        let path = self.asset_path(asset_id)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn get(&self, asset_id: &str) -> Result<Bytes, MediaError> {
        let path = self.asset_path(asset_id)?;
        if !path.exists() {
            return Err(MediaError::NotFound(asset_id.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }
}
