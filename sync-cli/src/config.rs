//! Configuration and on-disk layout for the CLI.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vaultsync_service::Config;
use vaultsync_vault::{BaselineStore, FsVault, JsonFileStore, BASELINE_FILE, STATE_DIR};

/// Config file name inside the state directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved locations for one vault.
#[derive(Debug, Clone)]
pub struct Paths {
    vault: PathBuf,
    config: Option<PathBuf>,
}

impl Paths {
    /// `config` overrides the default `<vault>/.vaultsync/config.toml`.
    pub fn new(vault: impl Into<PathBuf>, config: Option<PathBuf>) -> Self {
        Self {
            vault: vault.into(),
            config,
        }
    }

    /// The vault root.
    pub fn vault(&self) -> &Path {
        &self.vault
    }

    /// The state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.vault.join(STATE_DIR)
    }

    /// The config file in effect.
    pub fn config_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.state_dir().join(CONFIG_FILE))
    }

    /// The baseline file.
    pub fn baseline_file(&self) -> PathBuf {
        self.state_dir().join(BASELINE_FILE)
    }

    /// Load the config; a missing file yields defaults.
    pub fn load_config(&self) -> Result<Config> {
        let path = self.config_file();
        Config::load_or_default(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// Open the vault with the configured ignore names.
    pub fn open_vault(&self, config: &Config) -> Result<FsVault> {
        if !self.vault.is_dir() {
            anyhow::bail!("Vault directory {} does not exist", self.vault.display());
        }
        Ok(FsVault::new(&self.vault).with_ignore(config.vault.ignore.iter().cloned()))
    }

    /// The baseline state file as a store.
    pub fn state_store(&self) -> JsonFileStore {
        JsonFileStore::new(self.baseline_file())
    }

    /// The baseline store over [`Paths::state_store`].
    pub fn baseline(&self) -> BaselineStore<JsonFileStore> {
        BaselineStore::new(self.state_store())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_layout() {
        let paths = Paths::new("/notes", None);

        assert_eq!(paths.state_dir(), PathBuf::from("/notes/.vaultsync"));
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/notes/.vaultsync/config.toml")
        );
        assert_eq!(
            paths.baseline_file(),
            PathBuf::from("/notes/.vaultsync/baseline.json")
        );
    }

    #[test]
    fn config_override() {
        let paths = Paths::new("/notes", Some(PathBuf::from("/etc/vaultsync.toml")));
        assert_eq!(paths.config_file(), PathBuf::from("/etc/vaultsync.toml"));
    }

    #[test]
    fn missing_config_is_default() {
        let dir = tempdir().unwrap();
        let paths = Paths::new(dir.path(), None);

        assert_eq!(paths.load_config().unwrap(), Config::default());
    }

    #[test]
    fn broken_config_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = Paths::new(dir.path(), None);
        std::fs::create_dir_all(paths.state_dir()).unwrap();
        std::fs::write(paths.config_file(), "[server\n").unwrap();

        let err = paths.load_config().unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn missing_vault_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = Paths::new(dir.path().join("nope"), None);

        assert!(paths.open_vault(&Config::default()).is_err());
    }
}
