//! Show sync status.

use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use vaultsync_vault::build_snapshot;

use crate::config::Paths;

/// Run the status command.
pub async fn run(paths: &Paths) -> Result<()> {
    let config = paths.load_config()?;
    let vault = paths.open_vault(&config)?;

    println!("=== vaultsync status ===");
    println!();

    let current = build_snapshot(&vault)
        .await
        .context("Failed to scan vault")?;
    println!("Vault:");
    println!("  Path:  {}", paths.vault().display());
    println!("  Files: {}", current.len());
    let unsyncable = vault
        .unsyncable()
        .await
        .context("Failed to scan vault")?;
    if !unsyncable.is_empty() {
        println!("  Unsyncable: {} (names cannot be synced)", unsyncable.len());
        for path in &unsyncable {
            println!("    {}", path.display());
        }
    }
    println!();

    let baseline = match paths.baseline().load_record().await {
        Some(record) => {
            println!("Baseline:");
            println!("  Files: {}", record.files.len());
            println!("  Saved: {}", format_timestamp(record.saved_at));
            record.files
        }
        None => {
            println!("Baseline: NONE (never synced)");
            Default::default()
        }
    };
    println!();

    let pending = current.changed_since(&baseline);
    println!("Pending changes: {}", pending.len());
    for path in pending.iter().take(20) {
        println!("  {}", path);
    }
    if pending.len() > 20 {
        println!("  ... and {} more", pending.len() - 20);
    }

    Ok(())
}

/// Format a Unix timestamp as a human-readable age.
fn format_timestamp(ts: u64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let diff = now.saturating_sub(ts);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vaultsync_service::Config;

    #[tokio::test]
    async fn status_without_baseline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), b"a").unwrap();

        // Should succeed but show "never synced"
        let result = run(&Paths::new(dir.path(), None)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn status_with_baseline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), b"a").unwrap();
        let paths = Paths::new(dir.path(), None);

        let vault = paths.open_vault(&Config::default()).unwrap();
        let snapshot = build_snapshot(&vault).await.unwrap();
        paths.baseline().save(&snapshot).await.unwrap();

        let result = run(&paths).await;
        assert!(result.is_ok());
    }

    #[test]
    fn format_timestamp_works() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        assert_eq!(format_timestamp(now), "just now");
        assert!(format_timestamp(now - 120).contains("minutes"));
        assert!(format_timestamp(now - 7200).contains("hours"));
        assert!(format_timestamp(now - 172800).contains("days"));
    }
}
