use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

/// Distinguishes concurrent writes to the same destination.
static STAGED: AtomicU64 = AtomicU64::new(0);

/// Writes sprites into a directory on disk.
///
/// ```no_run
/// use spritesync_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("icons", "/home/me/.local/share/spritesync/icons")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}

impl LocalBackend {
    /// Open `root`, creating it (and its parents) when missing.
    ///
    /// # Errors
    /// [`InvalidRoot`](ErrorKind::InvalidRoot) for a relative path or a path
    /// that exists but isn't a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidRoot(root.to_path_buf()));
        }
        // Blocking is fine here: this runs once, before the runtime has
        // anything else to do.
        std::fs::create_dir_all(root).map_err(|e| ErrorKind::io(root, e))?;
        Ok(Self {
            name: name.into(),
            root: root.to_path_buf(),
        })
    }

    fn locate(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }
}

/// `normal/mew.png` is staged as `normal/.mew.png.<pid>-<n>.part`, unique
/// per write so two sprites that share a name never share a staging file.
fn staging_path(full: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(full.file_name().unwrap_or_default());
    name.push(format!(".{}-{}.part", std::process::id(), STAGED.fetch_add(1, Ordering::Relaxed)));
    full.with_file_name(name)
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let full = self.locate(path)?;
        Ok(fs::read(&full).await.map_err(|e| ErrorKind::io(path, e))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let full = self.locate(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ErrorKind::io(path, e))?;
        }
        let staged = staging_path(&full);
        fs::write(&staged, data).await.map_err(|e| ErrorKind::io(path, e))?;
        if let Err(e) = fs::rename(&staged, &full).await {
            let _ = fs::remove_file(&staged).await;
            exn::bail!(ErrorKind::io(path, e));
        }
        tracing::trace!(backend = %self.name, path = %path.display(), bytes = data.len(), "Wrote sprite");
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full = self.locate(path)?;
        Ok(fs::create_dir_all(&full).await.map_err(|e| ErrorKind::io(path, e))?)
    }
}
