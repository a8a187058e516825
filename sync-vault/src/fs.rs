//! Directory-backed vault.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use vaultsync_types::PathKey;
use walkdir::WalkDir;

use crate::error::VaultError;
use crate::vault::Vault;

/// Name of the per-vault state directory. Never synchronized.
pub const STATE_DIR: &str = ".vaultsync";

const TMP_SUFFIX: &str = ".vaultsync-tmp";

/// A vault rooted at a directory on disk.
///
/// Files are listed recursively. Entries whose file name matches an ignore
/// name are skipped along with everything beneath them, and writes into them
/// are refused. Files whose names cannot be expressed as a [`PathKey`]
/// (non-UTF-8, or containing `\`) are left out of listings and reported by
/// [`FsVault::unsyncable`].
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    ignore: Vec<String>,
}

impl FsVault {
    /// Create a vault over `root`. Only the state directory is ignored.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: vec![STATE_DIR.to_string()],
        }
    }

    /// Also ignore entries with these file names (e.g. `.git`).
    pub fn with_ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.ignore.contains(&name) {
                self.ignore.push(name);
            }
        }
        self
    }

    /// The vault root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The state directory inside this vault.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    fn full_path(&self, path: &PathKey) -> PathBuf {
        path.segments().fold(self.root.clone(), |acc, s| acc.join(s))
    }

    fn is_excluded(&self, path: &PathKey) -> bool {
        path.segments().any(|s| is_ignored(s, &self.ignore))
    }

    /// Files under the root that are left out of sync because their names
    /// cannot be represented as vault paths. Paths are relative to the root.
    pub async fn unsyncable(&self) -> Result<Vec<PathBuf>, VaultError> {
        Ok(self.scan().await?.skipped)
    }

    async fn scan(&self) -> Result<Scan, VaultError> {
        let root = self.root.clone();
        let ignore = self.ignore.clone();
        tokio::task::spawn_blocking(move || walk(&root, &ignore))
            .await
            .map_err(|e| VaultError::Task(e.to_string()))?
    }
}

fn is_ignored(name: &str, ignore: &[String]) -> bool {
    name.ends_with(TMP_SUFFIX) || ignore.iter().any(|i| i == name)
}

#[derive(Debug, Default)]
struct Scan {
    files: Vec<PathKey>,
    skipped: Vec<PathBuf>,
}

/// Key for a root-relative path, if every segment is a plain UTF-8 name
/// that maps back to the same file.
fn key_for(relative: &Path) -> Option<PathKey> {
    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return None;
        };
        let name = name.to_str()?;
        if name.contains('\\') {
            return None;
        }
        segments.push(name);
    }
    PathKey::new(&segments.join("/")).ok()
}

fn walk(root: &Path, ignore: &[String]) -> Result<Scan, VaultError> {
    let mut scan = Scan::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_ignored(&e.file_name().to_string_lossy(), ignore));

    for entry in walker {
        let entry = entry.map_err(|e| VaultError::Walk(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| VaultError::Walk(e.to_string()))?;
        match key_for(relative) {
            Some(key) => scan.files.push(key),
            None => scan.skipped.push(relative.to_path_buf()),
        }
    }

    scan.files.sort();
    scan.skipped.sort();
    Ok(scan)
}

#[async_trait]
impl Vault for FsVault {
    async fn list_files(&self) -> Result<Vec<PathKey>, VaultError> {
        let scan = self.scan().await?;
        for path in &scan.skipped {
            warn!(path = %path.display(), "Skipping file whose name cannot be synced");
        }
        Ok(scan.files)
    }

    async fn read_bytes(&self, path: &PathKey) -> Result<Vec<u8>, VaultError> {
        let full = self.full_path(path);
        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VaultError::NotFound {
                path: path.to_string(),
            },
            _ => VaultError::io(path, e),
        })
    }

    async fn write_bytes(&self, path: &PathKey, data: &[u8]) -> Result<(), VaultError> {
        if self.is_excluded(path) {
            return Err(VaultError::Excluded {
                path: path.to_string(),
            });
        }
        let full = self.full_path(path);
        let parent = full.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| VaultError::io(path, e))?;

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(".{}{}", file_name, TMP_SUFFIX));

        if let Err(e) = tokio::fs::write(&tmp, data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(VaultError::io(path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(VaultError::io(path, e));
        }

        debug!(path = %path, bytes = data.len(), "Wrote file");
        Ok(())
    }

    async fn exists(&self, path: &PathKey) -> bool {
        tokio::fs::metadata(self.full_path(path))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}
