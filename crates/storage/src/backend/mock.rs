use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Contents {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

/// Keeps written sprites in memory so tests can inspect what a run produced.
///
/// Paths are validated exactly as [`LocalBackend`](super::LocalBackend) does.
/// [`deny_writes`](Self::deny_writes) stands in for a disk that stops
/// accepting files partway through a run.
pub struct MockBackend {
    name: String,
    contents: Mutex<Contents>,
    denied: AtomicBool,
}

impl MockBackend {
    /// Every later [`write`](StorageBackend::write) fails with
    /// [`Denied`](ErrorKind::Denied).
    pub fn deny_writes(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    /// Every written path, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.contents.lock().await.files.keys().cloned().collect()
    }

    /// Whether `path` was passed to [`create_dir_all`](StorageBackend::create_dir_all).
    pub async fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.contents.lock().await.dirs.contains(path.as_ref())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            contents: Mutex::default(),
            denied: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let contents = self.contents.lock().await;
        Ok(contents.files.get(&path).cloned().ok_or(ErrorKind::Missing(path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.denied.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Denied(path));
        }
        self.contents.lock().await.files.insert(path, data.to_vec());
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        self.contents.lock().await.dirs.insert(path);
        Ok(())
    }
}
