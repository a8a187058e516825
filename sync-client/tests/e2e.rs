//! End-to-end sync between two on-disk vaults over loopback HTTP.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use vaultsync_client::{HttpTransport, SyncClient};
use vaultsync_core::PairingCode;
use vaultsync_service::{Config, SyncController, SyncService};
use vaultsync_types::{PathKey, Snapshot};
use vaultsync_vault::{build_snapshot, BaselineStore, FsVault, JsonFileStore, BASELINE_FILE};

fn state_for(root: &Path) -> JsonFileStore {
    JsonFileStore::new(FsVault::new(root).state_dir().join(BASELINE_FILE))
}

async fn serve(root: &Path) -> (SyncController, std::net::SocketAddr) {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".to_string();

    let controller = SyncController::new(Arc::new(SyncService::new(
        config,
        Arc::new(FsVault::new(root)),
        Arc::new(state_for(root)),
    )));
    let addr = controller.start(PairingCode::new(1)).await.unwrap();
    (controller, addr)
}

fn client(root: &Path) -> SyncClient<HttpTransport, FsVault, JsonFileStore> {
    SyncClient::new(
        HttpTransport::new(Duration::from_secs(5)).unwrap(),
        FsVault::new(root),
        state_for(root),
    )
}

async fn snapshot_of(root: &Path) -> Snapshot {
    build_snapshot(&FsVault::new(root)).await.unwrap()
}

async fn baseline_of(root: &Path) -> Snapshot {
    BaselineStore::new(state_for(root)).load().await
}

fn write(root: &Path, path: &str, data: &[u8]) {
    let full = root.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, data).unwrap();
}

fn key(path: &str) -> PathKey {
    PathKey::new(path).unwrap()
}

#[tokio::test]
async fn first_sync_merges_both_vaults() {
    let server_dir = tempdir().unwrap();
    let client_dir = tempdir().unwrap();
    write(server_dir.path(), "from-server.md", b"server");
    write(server_dir.path(), "shared.md", b"same");
    write(client_dir.path(), "notes/from-client.md", b"client");
    write(client_dir.path(), "shared.md", b"same");

    let (controller, addr) = serve(server_dir.path()).await;
    let report = client(client_dir.path()).sync(addr).await.unwrap();

    assert_eq!(report.pulled, vec![key("from-server.md")]);
    assert_eq!(report.pushed, vec![key("notes/from-client.md")]);
    assert_eq!(report.skipped, vec![key("shared.md")]);

    let server_snap = snapshot_of(server_dir.path()).await;
    let client_snap = snapshot_of(client_dir.path()).await;
    assert_eq!(server_snap, client_snap);
    assert_eq!(server_snap.len(), 3);

    assert_eq!(baseline_of(server_dir.path()).await, server_snap);
    assert_eq!(baseline_of(client_dir.path()).await, client_snap);

    controller.stop().await;
}

#[tokio::test]
async fn second_sync_is_a_noop() {
    let server_dir = tempdir().unwrap();
    let client_dir = tempdir().unwrap();
    write(server_dir.path(), "a.md", b"a");
    write(client_dir.path(), "b.md", b"b");

    let (controller, addr) = serve(server_dir.path()).await;
    let client = client(client_dir.path());
    client.sync(addr).await.unwrap();

    let server_mtime = std::fs::metadata(server_dir.path().join("b.md"))
        .unwrap()
        .modified()
        .unwrap();
    let report = client.sync(addr).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(report.skipped.len(), 2);
    assert!(report.conflicts.is_empty());
    assert_eq!(
        std::fs::metadata(server_dir.path().join("b.md"))
            .unwrap()
            .modified()
            .unwrap(),
        server_mtime
    );

    controller.stop().await;
}

#[tokio::test]
async fn one_sided_edits_flow_both_ways() {
    let server_dir = tempdir().unwrap();
    let client_dir = tempdir().unwrap();
    write(server_dir.path(), "server-edits.md", b"v1");
    write(server_dir.path(), "client-edits.md", b"v1");

    let (controller, addr) = serve(server_dir.path()).await;
    let client = client(client_dir.path());
    client.sync(addr).await.unwrap();

    write(server_dir.path(), "server-edits.md", b"v2 from server");
    write(client_dir.path(), "client-edits.md", b"v2 from client");

    let report = client.sync(addr).await.unwrap();

    assert_eq!(report.pulled, vec![key("server-edits.md")]);
    assert_eq!(report.pushed, vec![key("client-edits.md")]);
    assert!(report.conflicts.is_empty());
    assert_eq!(
        std::fs::read(client_dir.path().join("server-edits.md")).unwrap(),
        b"v2 from server"
    );
    assert_eq!(
        std::fs::read(server_dir.path().join("client-edits.md")).unwrap(),
        b"v2 from client"
    );

    controller.stop().await;
}

#[tokio::test]
async fn state_directory_is_never_synced() {
    let server_dir = tempdir().unwrap();
    let client_dir = tempdir().unwrap();
    write(server_dir.path(), "a.md", b"a");

    let (controller, addr) = serve(server_dir.path()).await;
    client(client_dir.path()).sync(addr).await.unwrap();

    let client_snap = snapshot_of(client_dir.path()).await;
    assert!(client_snap.paths().all(|p| !p.as_str().starts_with(".vaultsync")));

    controller.stop().await;
}

#[tokio::test]
async fn closed_session_is_connection_failure() {
    let server_dir = tempdir().unwrap();
    let client_dir = tempdir().unwrap();

    let (controller, addr) = serve(server_dir.path()).await;
    controller.stop().await;

    let result = client(client_dir.path()).sync(addr).await;

    assert!(matches!(
        result,
        Err(vaultsync_client::ClientError::ConnectionFailed(_))
    ));
}
