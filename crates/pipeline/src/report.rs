use derive_more::Display;
use spritesync_remote::FileEntry;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Why a single sprite was skipped. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Failure {
    #[display("no asset number in '{_0}'")]
    IdentityExtractionFailed(String),
    #[display("no canonical name for '{_0}'")]
    UnknownAsset(String),
    #[display("download failed: {_0}")]
    FetchFailed(String),
    #[display("could not decode image: {_0}")]
    DecodeFailed(String),
    #[display("image is fully transparent")]
    TrimFailed,
}

/// A skipped sprite and the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{}: {}", entry.path, failure)]
pub struct FailedAsset {
    pub entry: FileEntry,
    pub failure: Failure,
}

/// Run-wide tally, shared by every batch of every target.
#[derive(Debug, Default)]
pub struct RunReport {
    failures: Mutex<Vec<FailedAsset>>,
    saved: AtomicUsize,
}

impl RunReport {
    pub fn record_failure(&self, asset: FailedAsset) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).push(asset);
    }

    pub fn record_saved(&self) {
        self.saved.fetch_add(1, Ordering::Relaxed);
    }

    /// Failures in the order they were recorded.
    pub fn failures(&self) -> Vec<FailedAsset> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn failed(&self) -> usize {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::Relaxed)
    }

    /// One line naming every skipped file by its remote path, or `None` if
    /// nothing was skipped.
    pub fn summary(&self) -> Option<String> {
        let mut paths: Vec<_> = self.failures().into_iter().map(|f| f.entry.path).collect();
        if paths.is_empty() {
            return None;
        }
        paths.sort_unstable();
        Some(format!("These images were skipped due to errors: '{}'.", paths.join("', '")))
    }
}
