//! Serve command - listen for one sync session.
//!
//! The listener stays up for the configured session timeout, then closes on
//! its own. Ctrl+C closes it early.

use anyhow::{Context, Result};
use std::sync::Arc;
use vaultsync_core::{probe_local_ipv4, PairingCode};
use vaultsync_service::{SessionEnd, SyncController, SyncService};

use crate::config::Paths;

/// Run the serve command.
pub async fn run(paths: &Paths) -> Result<()> {
    let config = paths.load_config()?;
    let vault = paths.open_vault(&config)?;
    let timeout = config.server.session_timeout();

    let local = probe_local_ipv4().context("Could not determine this machine's LAN address")?;
    let code = PairingCode::from_local(local);

    let service = SyncService::new(config, Arc::new(vault), Arc::new(paths.state_store()));
    let controller = SyncController::new(Arc::new(service));

    let addr = controller
        .start(code)
        .await
        .context("Failed to start listener")?;

    println!("Listening on {} for {}s", addr, timeout.as_secs());
    println!();
    println!("  Pairing code: {}", code);
    println!();
    println!("On the other machine run: vaultsync connect {}", code);

    let end = tokio::select! {
        end = controller.wait() => end,
        _ = tokio::signal::ctrl_c() => controller.stop().await,
    };

    match end {
        Some(SessionEnd::Expired) => println!("Session expired, listener closed."),
        Some(SessionEnd::Stopped) => println!("Listener stopped."),
        Some(SessionEnd::Failed) => anyhow::bail!("Listener failed"),
        None => {}
    }

    Ok(())
}
