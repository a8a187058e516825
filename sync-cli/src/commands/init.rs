//! Create the state directory and a default config.

use anyhow::{Context, Result};
use vaultsync_service::Config;

use crate::config::Paths;

/// Run the init command.
pub async fn run(paths: &Paths) -> Result<()> {
    let config_file = paths.config_file();

    // Check if already initialized
    if tokio::fs::try_exists(&config_file).await.unwrap_or(false) {
        anyhow::bail!(
            "Vault already initialized. Delete {} to reinitialize.",
            config_file.display()
        );
    }

    tokio::fs::create_dir_all(paths.state_dir())
        .await
        .context("Failed to create state directory")?;
    if let Some(parent) = config_file.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create config directory")?;
    }

    let toml = Config::default().to_toml()?;
    tokio::fs::write(&config_file, toml)
        .await
        .with_context(|| format!("Failed to write {}", config_file.display()))?;

    println!("Vault initialized successfully!");
    println!();
    println!("  Vault:  {}", paths.vault().display());
    println!("  Config: {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. On this machine:    vaultsync serve");
    println!("  2. On the other peer:  vaultsync connect <code>");

    Ok(())
}
