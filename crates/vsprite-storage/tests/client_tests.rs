//! Object store integration tests. Run against a live MinIO:
//! `cargo test -p vsprite-storage -- --ignored`

use vsprite_models::VideoId;
use vsprite_storage::{keys, ObjectStore, StorageError};

fn client() -> ObjectStore {
    dotenvy::dotenv().ok();
    ObjectStore::from_env().expect("Failed to create client")
}

#[tokio::test]
#[ignore = "requires MinIO"]
async fn test_connectivity() {
    client().check_connectivity().await.expect("Bucket unreachable");
}

#[tokio::test]
#[ignore = "requires MinIO"]
async fn test_upload_stat_get_delete() {
    let store = client();
    let key = keys::upload_key(&VideoId::new(), "mp4");
    let payload = b"not really a video".to_vec();

    store
        .upload_bytes(payload.clone(), &key, "video/mp4")
        .await
        .expect("upload failed");

    let stat = store.stat(&key).await.expect("stat failed");
    assert_eq!(stat.size, payload.len() as u64);
    assert_eq!(stat.content_type.as_deref(), Some("video/mp4"));

    let bytes = store.get_bytes(&key).await.expect("get failed");
    assert_eq!(bytes, payload);

    store.delete_object(&key).await.expect("delete failed");
    assert!(!store.exists(&key).await.expect("exists failed"));
}

#[tokio::test]
#[ignore = "requires MinIO"]
async fn test_range_read() {
    let store = client();
    let key = keys::upload_key(&VideoId::new(), "bin");
    let payload: Vec<u8> = (0..=255).collect();

    store
        .upload_bytes(payload.clone(), &key, "application/octet-stream")
        .await
        .expect("upload failed");

    // Inclusive range semantics
    let chunk = store.get_range(&key, 10, 19).await.expect("range failed");
    assert_eq!(chunk, &payload[10..=19]);

    store.delete_object(&key).await.expect("delete failed");
}

#[tokio::test]
#[ignore = "requires MinIO"]
async fn test_missing_key_is_not_found() {
    let store = client();
    let key = keys::metadata_key(&VideoId::new());

    // GetObject and HeadObject report a missing key through different
    // service errors; both must map to NotFound, not a generic failure.
    match store.get_bytes(&key).await {
        Err(StorageError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|b| b.len())),
    }

    match store.stat(&key).await {
        Err(StorageError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.size)),
    }

    assert!(!store.exists(&key).await.expect("exists failed"));
}

#[tokio::test]
#[ignore = "requires MinIO"]
async fn test_download_file_writes_full_object() {
    let store = client();
    let dir = tempfile::TempDir::new().expect("tempdir failed");
    let key = keys::upload_key(&VideoId::new(), "bin");
    let payload: Vec<u8> = (0u32..1 << 20).map(|i| (i % 251) as u8).collect();

    store
        .upload_bytes(payload.clone(), &key, "application/octet-stream")
        .await
        .expect("upload failed");

    let path = dir.path().join("nested").join("out.bin");
    let size = store.download_file(&key, &path).await.expect("download failed");
    assert_eq!(size, payload.len() as u64);
    assert_eq!(tokio::fs::read(&path).await.expect("read failed"), payload);

    store.delete_object(&key).await.expect("delete failed");
}
