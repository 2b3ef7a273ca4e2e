use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::media::MediaError;
use crate::AppState;

/// Serve an asset of the local media backend.
/// Route: GET /media/*asset_id
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.media.get(&asset_id).await.map_err(|e| match e {
        MediaError::NotFound(_) | MediaError::InvalidAssetId(_) => ApiError::NotFound,
        _ => {
            tracing::error!(asset_id = %asset_id, error = %e, "Failed to read asset");
            ApiError::Internal
        }
    })?;

    let mime_type = mime_guess::from_path(&asset_id)
        .first_or_octet_stream()
        .to_string();
    let byte_size = data.len() as u64;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(byte_size));

    // Asset ids are never reused, so the bytes behind one never change
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    Ok(response)
}
