//! The sync pipeline: resolve each target's remote directory, pick and order
//! its sprites, then fetch, trim, scale and save them in paced batches.
//!
//! Everything hangs off a [`Context`], built once per run and borrowed by every
//! stream and task. Progress comes back as [`SyncEvent`]s from [`sync_all`].

mod batch;
pub mod catalog;
pub mod error;
mod names;
mod process;
mod report;
mod sync;
#[cfg(test)]
mod test_support;

pub use crate::batch::{BatchState, SyncEvent, run_batches};
pub use crate::catalog::{AssetId, Catalog};
pub use crate::names::{InvalidNameTable, NameTable};
pub use crate::process::{Outcome, process_one};
pub use crate::report::{FailedAsset, Failure, RunReport};
pub use crate::sync::{prepare_target, sync_all, sync_target};
use derive_more::Display;
use spritesync_config::{Config, TargetConfig};
use spritesync_remote::{RemoteHandle, TreeResolver};
use spritesync_storage::BackendHandle;
use std::path::PathBuf;
use std::time::Duration;

/// A remote directory paired with the local directory its sprites are saved
/// to, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{}", local.display())]
pub struct SyncTarget {
    pub remote: String,
    pub local: PathBuf,
}

impl From<&TargetConfig> for SyncTarget {
    fn from(config: &TargetConfig) -> Self {
        Self {
            remote: config.remote.clone(),
            local: config.local.clone(),
        }
    }
}

/// Shared, read-mostly state for one run.
pub struct Context {
    pub(crate) remote: RemoteHandle,
    pub(crate) storage: BackendHandle,
    pub(crate) resolver: TreeResolver,
    pub(crate) catalog: Catalog,
    pub(crate) names: NameTable,
    pub(crate) report: RunReport,
    pub(crate) scale: f64,
    pub(crate) batch_size: usize,
    pub(crate) batch_delay: Duration,
}

impl Context {
    pub fn new(config: &Config, remote: RemoteHandle, storage: BackendHandle, names: NameTable) -> Self {
        Self {
            resolver: TreeResolver::new(remote.clone(), config.tree_url.clone(), config.raw_url.clone()),
            remote,
            storage,
            catalog: Catalog::new(&config.filter),
            names,
            report: RunReport::default(),
            scale: config.scale,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }
}
