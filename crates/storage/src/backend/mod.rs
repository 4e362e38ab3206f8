mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// A destination for encoded sprites.
///
/// Paths are relative to the backend's root and pass through
/// [`validate_path`](crate::validate_path) before anything is touched, so a
/// hostile name table can't write outside it.
///
/// ```
/// use std::path::Path;
/// use spritesync_storage::{StorageBackend, error::Result};
///
/// async fn save_icon(backend: &dyn StorageBackend, png: &[u8]) -> Result<()> {
///     backend.create_dir_all(Path::new("normal")).await?;
///     backend.write(Path::new("normal/bulbasaur.png"), png).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Shown in logs.
    fn name(&self) -> &str;

    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace whatever is at `path` with `data`, creating parent directories
    /// as needed. Readers never observe a half-written file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Succeeds if the directory already exists.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
}
