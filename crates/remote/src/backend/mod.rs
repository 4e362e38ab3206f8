//! Remote transport trait and implementations.
//!
//! Two kinds of request reach the remote: tree listings against the API and
//! raw file downloads. They are separate methods because they carry different
//! headers (and credentials only ever go to the API).

#[cfg(feature = "http")]
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

#[cfg(feature = "http")]
pub use self::http::{HttpBackend, HttpOptions};
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{MockEvent, MockRemote};
use crate::error::Result;
use async_trait::async_trait;

/// Transport used by the tree resolver and the asset pipeline.
///
/// # Examples
///
/// ```
/// use spritesync_remote::{backend::RemoteBackend, error::Result};
///
/// async fn icon_size(remote: &dyn RemoteBackend) -> Result<usize> {
///     let bytes = remote.download("https://example.org/sprites/25.png").await?;
///     Ok(bytes.len())
/// }
/// ```
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Fetch the body of a tree listing endpoint.
    ///
    /// A non-success response whose body carries a `message` is reported as
    /// [`RemoteError`](crate::error::ErrorKind::RemoteError) so the upstream
    /// reason (rate limiting, unknown sha, ...) is not lost.
    async fn list(&self, url: &str) -> Result<Vec<u8>>;

    /// Download raw file contents.
    ///
    /// Any non-success status is an error.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}
