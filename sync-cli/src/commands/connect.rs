//! Connect command - sync against a listening peer.

use anyhow::{Context, Result};
use dialoguer::Input;
use vaultsync_client::{HttpTransport, SyncClient};
use vaultsync_core::PairingCode;

use crate::config::Paths;

/// Run the connect command.
pub async fn run(paths: &Paths, code: Option<&str>) -> Result<()> {
    let config = paths.load_config()?;
    let vault = paths.open_vault(&config)?;

    let code = match code {
        Some(code) => parse_code(code)?,
        None => prompt_code()?,
    };

    let transport = HttpTransport::new(config.client.request_timeout())
        .context("Failed to create HTTP client")?;
    let client = SyncClient::new(transport, vault, paths.state_store())
        .with_policy(config.client.conflict_policy)
        .with_port(config.client.port);

    println!("Connecting with code {}...", code);
    let report = client
        .connect_with_code(code)
        .await
        .context("Sync failed")?;

    println!("Sync complete: {}", report);
    for path in &report.conflicts {
        println!("  conflict: {}", path);
    }
    for (path, error) in &report.failed {
        println!("  failed:   {} ({})", path, error);
    }

    Ok(())
}

fn parse_code(code: &str) -> Result<PairingCode> {
    code.parse()
        .with_context(|| format!("Invalid pairing code '{}'", code))
}

fn prompt_code() -> Result<PairingCode> {
    let code: PairingCode = Input::new()
        .with_prompt("Pairing code")
        .interact_text()
        .context("Failed to read pairing code")?;
    Ok(code)
}
