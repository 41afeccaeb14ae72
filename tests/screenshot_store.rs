use std::fs;

use tempfile::TempDir;

use diagstore::{
    runtime::handle::{StoreConfig, spawn_store},
    screenshot::{ScreenshotError, ScreenshotStore},
};

const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[test]
fn anonymous_saves_produce_distinct_files() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    let first = store.save(PNG_STUB, None).expect("first save");
    let second = store.save(PNG_STUB, None).expect("second save");

    assert_ne!(first, second);
    assert!(first.exists());
    assert!(second.exists());
}

#[test]
fn names_are_sanitized_into_the_sandbox() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    let path = store
        .save(PNG_STUB, Some("../../escape"))
        .expect("save with traversal name");

    assert_eq!(path.parent(), Some(store.dir()));
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("escape.png"));
}

#[test]
fn extension_is_appended_only_when_missing() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    let bare = store.save(PNG_STUB, Some("crash-shot")).expect("bare name");
    assert_eq!(
        bare.file_name().and_then(|n| n.to_str()),
        Some("crash-shot.png")
    );

    let with_ext = store.save(PNG_STUB, Some("frame.jpg")).expect("jpg name");
    assert_eq!(
        with_ext.file_name().and_then(|n| n.to_str()),
        Some("frame.jpg")
    );
}

#[test]
fn empty_image_is_rejected_and_writes_nothing() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    let err = store.save(&[], Some("nothing")).expect_err("empty input");
    assert!(matches!(err, ScreenshotError::EmptyImage));

    let entries = fs::read_dir(store.dir()).expect("read dir").count();
    assert_eq!(entries, 0);
}

#[test]
fn unusable_names_are_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    let err = store.save(PNG_STUB, Some("..")).expect_err("dot-dot name");
    assert!(matches!(err, ScreenshotError::UnusableName(_)));

    let err = store.save(PNG_STUB, Some("   ")).expect_err("blank name");
    assert!(matches!(err, ScreenshotError::UnusableName(_)));
}

#[test]
fn same_name_replaces_existing_file() {
    let tmp = TempDir::new().expect("tmp");
    let store = ScreenshotStore::open(tmp.path().join("shots")).expect("open");

    store.save(b"old bytes", Some("shot.png")).expect("first write");
    let path = store.save(b"new bytes", Some("shot.png")).expect("overwrite");

    assert_eq!(fs::read(&path).expect("read back"), b"new bytes");
    let entries = fs::read_dir(store.dir()).expect("read dir").count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn handle_saves_screenshots_on_the_worker() {
    let tmp = TempDir::new().expect("tmp");
    let handle = spawn_store(StoreConfig::new(tmp.path()), None).expect("spawn");

    let path = handle
        .save_screenshot(PNG_STUB.to_vec(), Some("boot".to_string()))
        .await
        .expect("save screenshot");

    assert_eq!(path, tmp.path().join("screenshots").join("boot.png"));
    assert!(path.exists());

    let generated = handle
        .save_screenshot(PNG_STUB.to_vec(), None)
        .await
        .expect("generated name");
    assert!(generated.exists());
    assert_ne!(generated, path);

    handle.shutdown().await.expect("shutdown");
}
