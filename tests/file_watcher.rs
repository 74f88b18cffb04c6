// tests/file_watcher.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;

use assetpipe::config::PathTable;
use assetpipe::engine::RuntimeEvent;
use assetpipe::types::AssetClass;
use assetpipe::watch::{build_class_profiles, spawn_watcher};

#[tokio::test]
async fn scss_write_is_reported_for_styles_only() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for sub in ["src/styles", "src/scripts", "src/images", "dist"] {
        fs::create_dir_all(root.join(sub)).unwrap();
    }

    let profiles = build_class_profiles(&PathTable::default()).unwrap();
    let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = spawn_watcher(root, profiles, tx).unwrap();

    // Give the backend a moment to register before the write.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(root.join("src/styles/main.scss"), ".a { color: red; }").unwrap();

    let first = with_timeout(rx.recv()).await.unwrap();
    let mut events = vec![first];

    // Collect whatever else notify reports for the same write.
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await {
        events.push(event);
    }

    for event in events.iter() {
        match event {
            RuntimeEvent::SourceChanged { class, path } => {
                assert_eq!(*class, AssetClass::Styles);
                assert_eq!(path, "src/styles/main.scss");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

#[tokio::test]
async fn unmatched_paths_produce_no_events() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("notes")).unwrap();

    let profiles = build_class_profiles(&PathTable::default()).unwrap();
    let (tx, mut rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = spawn_watcher(root, profiles, tx).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(root.join("notes/todo.txt"), "nothing to build").unwrap();

    let received = tokio::time::timeout(Duration::from_millis(800), rx.recv()).await;
    assert!(received.is_err(), "got {received:?}");
}
