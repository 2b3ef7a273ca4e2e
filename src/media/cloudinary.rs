use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use reqwest::Client;
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use serde::Deserialize;

use super::{MediaError, MediaStore, UploadedAsset};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Every upload is bounded to 1200x630, converted to webp and quality-optimised.
pub const UPLOAD_TRANSFORMATION: &str = "c_limit,h_630,w_1200/q_auto";
const UPLOAD_FORMAT: &str = "webp";

/// Cloudinary-backed media store using signed upload/destroy calls.
pub struct CloudinaryStore {
    api_key: String,
    api_secret: String,
    client: Client,
    cloud_name: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Result<Self, anyhow::Error> {
        let client = Client::builder().build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            client,
            cloud_name: cloud_name.to_string(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{API_BASE}/{}/image/upload", self.cloud_name)
    }

    fn destroy_url(&self) -> String {
        format!("{API_BASE}/{}/image/destroy", self.cloud_name)
    }

    /// Append `api_key` and `signature` to the signed parameters.
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(
        &self,
        data: Bytes,
        folder: &str,
        file_name: &str,
    ) -> Result<UploadedAsset, MediaError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let data_uri = format!(
            "data:{mime};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&data)
        );

        let mut form = self.signed_form(vec![
            ("folder", folder.to_string()),
            ("format", UPLOAD_FORMAT.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
            ("transformation", UPLOAD_TRANSFORMATION.to_string()),
        ]);
        form.push(("file", data_uri));

        let resp = self
            .client
            .post(self.upload_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MediaError::Backend(format!(
                "Cloudinary upload failed ({status}): {body}"
            )));
        }

        let uploaded: UploadResponse = resp
            .json()
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        Ok(UploadedAsset {
            url: uploaded.secure_url,
            asset_id: uploaded.public_id,
        })
    }

    async fn remove(&self, asset_id: &str) -> Result<(), MediaError> {
        let form = self.signed_form(vec![
            ("public_id", asset_id.to_string()),
            ("timestamp", chrono::Utc::now().timestamp().to_string()),
        ]);

        let resp = self
            .client
            .post(self.destroy_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MediaError::Backend(format!(
                "Cloudinary destroy failed ({status}): {body}"
            )));
        }

        let destroyed: DestroyResponse = resp
            .json()
            .await
            .map_err(|e| MediaError::Backend(e.to_string()))?;

        // "not found" is fine -- asset already gone
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Backend(format!(
                "Cloudinary destroy returned '{other}'"
            ))),
        }
    }

    /// Clients load Cloudinary assets from their delivery URL, never through us.
    async fn get(&self, asset_id: &str) -> Result<Bytes, MediaError> {
        Err(MediaError::NotFound(asset_id.to_string()))
    }
}

/// The string Cloudinary signs: parameters sorted by name, joined as `k=v&k=v`.
fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let payload = format!("{}{api_secret}", string_to_sign(params));
    hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, payload.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_sign_sorts_parameters() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("folder", "posts/1/banner".to_string()),
            ("format", "webp".to_string()),
        ];
        assert_eq!(
            string_to_sign(&params),
            "folder=posts/1/banner&format=webp&timestamp=1315060510"
        );
    }

    #[test]
    fn test_sign_is_sha1_of_payload_and_secret() {
        // sha1("a=bc") where "a=b" is the payload and "c" the secret
        let params = vec![("a", "b".to_string())];
        assert_eq!(
            sign(&params, "c"),
            hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, b"a=bc"))
        );
        // known vector: sha1("abc")
        assert_eq!(
            hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_signed_form_appends_credentials() {
        let store = CloudinaryStore::new("demo", "key-123", "secret").unwrap();
        let form = store.signed_form(vec![("public_id", "sample".to_string())]);
        let names: Vec<&str> = form.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["public_id", "api_key", "signature"]);
        assert_eq!(form[1].1, "key-123");
        assert_eq!(form[2].1.len(), 40);
    }

    #[tokio::test]
    async fn test_get_is_not_served() {
        let store = CloudinaryStore::new("demo", "key-123", "secret").unwrap();
        let result = store.get("posts/1/banner/sample").await;
        assert!(matches!(result, Err(MediaError::NotFound(id)) if id == "posts/1/banner/sample"));
    }
}
