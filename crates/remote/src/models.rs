//! Remote models.
//!
//! Wire types mirror the Git trees API payload; [`FileEntry`] is what the rest
//! of the workspace sees.

use serde::Deserialize;

/// Body of a tree listing response.
///
/// A successful response carries `tree`; a failed one carries `message`
/// in its place.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Option<Vec<TreeItem>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeItem {
    /// Name relative to the listed tree (the API does not recurse by default).
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub sha: String,
    /// Absent for sub-trees.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ItemKind {
    Blob,
    Tree,
    /// Submodules (`commit`) and anything else we don't know how to walk.
    #[serde(other)]
    Other,
}

/// One file within a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the tree root, e.g. `shiny/25.png`.
    pub path: String,
    /// Content-addressing token from the remote (git blob sha).
    pub sha: String,
    /// File size in bytes
    pub size: u64,
    /// API endpoint of the blob.
    pub url: String,
    /// Raw-content endpoint the bytes are downloaded from.
    pub download_url: String,
}
impl FileEntry {
    /// The final path component, e.g. `25.png`.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// The file name without its extension, e.g. `25` or `412-sandy`.
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(name[idx + 1..].to_ascii_lowercase()),
        }
    }
}
