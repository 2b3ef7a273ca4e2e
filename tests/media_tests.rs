use bytes::Bytes;
use blog_cms::media::{LocalStore, MediaError, MediaStore};

fn store(dir: &tempfile::TempDir) -> LocalStore {
    LocalStore::new(dir.path(), "http://localhost:8080/").unwrap()
}

#[tokio::test]
async fn test_local_store_upload_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let data = Bytes::from("not really a png");
    let asset = store
        .upload(data.clone(), "users/u1/images", "Photo.PNG")
        .await
        .unwrap();

    assert!(asset.asset_id.starts_with("users/u1/images/"));
    assert!(asset.asset_id.ends_with(".png"));
    assert_eq!(
        asset.url,
        format!("http://localhost:8080/media/{}", asset.asset_id)
    );

    let retrieved = store.get(&asset.asset_id).await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_uploads_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let a = store.upload(Bytes::from("a"), "f", "a.png").await.unwrap();
    let b = store.upload(Bytes::from("b"), "f", "a.png").await.unwrap();

    assert_ne!(a.asset_id, b.asset_id);
    assert_eq!(store.get(&a.asset_id).await.unwrap(), Bytes::from("a"));
}

#[tokio::test]
async fn test_local_store_remove() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let asset = store.upload(Bytes::from("data"), "f", "a.webp").await.unwrap();
    store.remove(&asset.asset_id).await.unwrap();

    assert!(matches!(
        store.get(&asset.asset_id).await,
        Err(MediaError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_local_store_remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let asset = store.upload(Bytes::from("data"), "f", "a.jpg").await.unwrap();
    store.remove(&asset.asset_id).await.unwrap();

    // An asset that is already gone counts as removed
    store.remove(&asset.asset_id).await.unwrap();
    store.remove("f/never-existed.jpg").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let result = store.get("missing.png").await;
    assert!(matches!(result, Err(MediaError::NotFound(_))));
}

#[tokio::test]
async fn test_local_store_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let media_dir = dir.path().join("media");
    std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();
    let store = LocalStore::new(&media_dir, "http://localhost").unwrap();

    for asset_id in ["../secret.txt", "/etc/passwd", "a/../../secret.txt", ""] {
        assert!(
            matches!(
                store.get(asset_id).await,
                Err(MediaError::InvalidAssetId(_))
            ),
            "{asset_id:?} should be rejected"
        );
        assert!(store.remove(asset_id).await.is_err());
    }
    assert!(dir.path().join("secret.txt").exists());
}

#[tokio::test]
async fn test_local_store_rejects_escaping_folder() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let result = store.upload(Bytes::from("x"), "../outside", "a.png").await;
    assert!(matches!(result, Err(MediaError::InvalidAssetId(_))));
}
