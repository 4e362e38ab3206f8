//! Remote side of a sync: resolving directories in a Git-style tree API and
//! downloading raw file contents.
//!
//! The [`TreeResolver`] expands directories lazily, one listing request per
//! directory per run. Requests go through a [`RemoteBackend`], which is
//! [`HttpBackend`] in production (feature `http`, on by default) and
//! [`MockRemote`](backend::MockRemote) in tests (feature `mock`).

pub mod backend;
pub mod error;
mod models;
mod tree;

pub use crate::backend::RemoteBackend;
#[cfg(feature = "http")]
pub use crate::backend::{HttpBackend, HttpOptions};
pub use crate::models::FileEntry;
pub use crate::tree::{PATH_PLACEHOLDER, TreeNode, TreeResolver};
use std::sync::Arc;

pub type RemoteHandle = Arc<dyn RemoteBackend + Send + Sync>;
