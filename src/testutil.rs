//! Shared test helpers for in-crate tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use crate::actions::auth::{self, RegisterInput};
use crate::config::{AuthConfig, Config, MediaConfig, ServerConfig};
use crate::media::{MediaError, MediaStore, UploadedAsset};
use crate::session::{resolve_session, CurrentUser};
use crate::storage::Database;
use crate::AppState;

/// In-memory media host that records every call.
#[derive(Default)]
pub struct RecordingMedia {
    assets: Mutex<HashMap<String, Bytes>>,
    removed: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

impl RecordingMedia {
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.assets.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for RecordingMedia {
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        _file_name: &str,
    ) -> Result<UploadedAsset, MediaError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("upload rejected".to_string()));
        }
        let asset_id = format!("{folder}/{}", uuid::Uuid::new_v4());
        self.assets.lock().unwrap().insert(asset_id.clone(), data);
        Ok(UploadedAsset {
            url: format!("https://media.test/{asset_id}"),
            asset_id,
        })
    }

    async fn remove(&self, asset_id: &str) -> Result<(), MediaError> {
        self.assets.lock().unwrap().remove(asset_id);
        self.removed.lock().unwrap().push(asset_id.to_string());
        Ok(())
    }

    async fn get(&self, asset_id: &str) -> Result<Bytes, MediaError> {
        self.assets
            .lock()
            .unwrap()
            .get(asset_id)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(asset_id.to_string()))
    }
}

/// Create a test AppState with a temporary database and a recording media host.
pub fn test_state(temp_dir: &tempfile::TempDir) -> (Arc<AppState>, Arc<RecordingMedia>) {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        auth: AuthConfig {
            secure_cookies: false,
            ..AuthConfig::default()
        },
        media: MediaConfig::default(),
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
            public_base_url: "http://localhost".to_string(),
        },
        max_image_size: 1024 * 1024,
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let media = Arc::new(RecordingMedia::default());

    let state = Arc::new(AppState {
        config,
        db,
        media: media.clone(),
    });
    (state, media)
}

/// A registered user with live credentials.
pub struct TestUser {
    pub current: CurrentUser,
    pub session_token: String,
    pub api_key: String,
}

pub async fn register_user(state: &AppState, email: &str) -> TestUser {
    let outcome = auth::register(
        state,
        &RegisterInput {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
        },
    )
    .await;
    let signed_in = outcome.data.expect("registration should succeed");

    let current = resolve_session(&state.db, &signed_in.session_token)
        .unwrap()
        .expect("fresh session should resolve");

    TestUser {
        current,
        session_token: signed_in.session_token,
        api_key: signed_in.api_key.expect("registration issues a key"),
    }
}

pub fn png(name: &str) -> crate::actions::validation::ImageUpload {
    crate::actions::validation::ImageUpload {
        data: Bytes::from_static(b"\x89PNG\r\n\x1a\nfake"),
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
    }
}
