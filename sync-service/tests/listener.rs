//! End-to-end tests against a real listener on loopback.

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use vaultsync_core::PairingCode;
use vaultsync_service::{Config, SessionEnd, SyncController, SyncService};
use vaultsync_types::{ChangeRecord, FileRecord, PathKey};
use vaultsync_vault::{FsVault, JsonFileStore, BASELINE_FILE};

fn controller_for(root: &std::path::Path, timeout_secs: u64) -> SyncController {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.server.session_timeout_secs = timeout_secs;

    let vault = FsVault::new(root);
    let state = JsonFileStore::new(vault.state_dir().join(BASELINE_FILE));
    SyncController::new(Arc::new(SyncService::new(
        config,
        Arc::new(vault),
        Arc::new(state),
    )))
}

#[tokio::test]
async fn fetch_and_push_over_http() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("hello.md"), b"hello").unwrap();
    let ctl = controller_for(dir.path(), 30);
    let addr = ctl.start(PairingCode::new(1)).await.unwrap();
    let client = reqwest::Client::new();

    let records: Vec<FileRecord> = client
        .get(format!("http://{}/hashes", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].data, b"hello");

    let changes = vec![ChangeRecord::new(
        PathKey::new("sub/pushed.md").unwrap(),
        b"from peer".to_vec(),
    )];
    let response = client
        .post(format!("http://{}/changes", addr))
        .json(&changes)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert_eq!(
        std::fs::read(dir.path().join("sub/pushed.md")).unwrap(),
        b"from peer"
    );
    assert!(dir.path().join(".vaultsync").join(BASELINE_FILE).exists());

    ctl.stop().await;
}

#[tokio::test]
async fn malformed_request_does_not_kill_listener() {
    let dir = tempdir().unwrap();
    let ctl = controller_for(dir.path(), 30);
    let addr = ctl.start(PairingCode::new(1)).await.unwrap();
    let client = reqwest::Client::new();

    let bad = client
        .post(format!("http://{}/changes", addr))
        .body("this is not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);

    let good = client
        .post(format!("http://{}/changes", addr))
        .body("[]")
        .send()
        .await
        .unwrap();
    assert_eq!(good.status(), 200);
    assert!(ctl.is_listening().await);

    ctl.stop().await;
}

#[tokio::test]
async fn session_timeout_closes_listener() {
    let dir = tempdir().unwrap();
    let ctl = controller_for(dir.path(), 1);
    let addr = ctl.start(PairingCode::new(1)).await.unwrap();

    // Reachable during the session
    assert!(tokio::net::TcpStream::connect(addr).await.is_ok());

    let end = tokio::time::timeout(Duration::from_secs(10), ctl.wait())
        .await
        .expect("listener should close on its own");
    assert_eq!(end, Some(SessionEnd::Expired));

    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
