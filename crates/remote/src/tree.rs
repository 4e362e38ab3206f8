//! Lazy resolution of a remote directory tree.
//!
//! Each [`TreeNode`] owns its children. A node's listing sits behind its own
//! [`OnceCell`], so concurrent resolutions that share a path prefix still
//! fetch every directory exactly once, and without a global lock.

use crate::RemoteHandle;
use crate::error::{ErrorKind, Result};
use crate::models::{FileEntry, ItemKind, TreeResponse};
use exn::{OptionExt, ResultExt};
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::instrument;

/// Placeholder substituted with a file's path in the raw-content template.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// One directory in the remote hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    /// Path from the tree root, without leading or trailing slashes.
    path: String,
    url: String,
    listing: OnceCell<Listing>,
}

#[derive(Debug, Default)]
struct Listing {
    files: Vec<FileEntry>,
    dirs: HashMap<String, TreeNode>,
}

impl TreeNode {
    fn stub(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            listing: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether this node's listing has been fetched. A populated node with no
    /// children is confirmed empty; an unpopulated one is simply unknown.
    pub fn is_populated(&self) -> bool {
        self.listing.initialized()
    }

    /// Names of the child directories, if the listing has been fetched.
    pub fn child_names(&self) -> Option<Vec<&str>> {
        self.listing.get().map(|l| {
            let mut names: Vec<_> = l.dirs.keys().map(String::as_str).collect();
            names.sort_unstable();
            names
        })
    }

    fn join(&self, name: &str) -> String {
        match self.path.is_empty() {
            true => name.to_string(),
            false => format!("{}/{}", self.path, name),
        }
    }
}

/// Walks a remote tree, fetching directory listings on demand.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use spritesync_remote::{HttpBackend, HttpOptions, TreeResolver};
///
/// # async fn example() -> spritesync_remote::error::Result<()> {
/// let remote = Arc::new(HttpBackend::new(HttpOptions::default())?);
/// let resolver = TreeResolver::new(
///     remote,
///     "https://api.github.com/repos/PokeAPI/sprites/git/trees/master",
///     "https://raw.githubusercontent.com/PokeAPI/sprites/master/{path}",
/// );
/// let shiny = resolver.resolve("/sprites/pokemon/shiny").await?;
/// for file in resolver.files(shiny).await? {
///     println!("{} ({} bytes)", file.path, file.size);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TreeResolver {
    remote: RemoteHandle,
    root: TreeNode,
    raw_url: String,
}

impl TreeResolver {
    /// `raw_url` is a template for file downloads; [`PATH_PLACEHOLDER`] is
    /// replaced with the file's path relative to the tree root.
    pub fn new(remote: RemoteHandle, root_url: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            remote,
            root: TreeNode::stub("", root_url),
            raw_url: raw_url.into(),
        }
    }

    /// Resolve a slash-separated path (`/a/b`, `a/b/`, or `""` for the root)
    /// to its directory node.
    ///
    /// Every directory along the way is listed at most once over the lifetime
    /// of the resolver; the returned node itself is not listed until its
    /// [`files`](Self::files) are requested.
    ///
    /// # Errors
    /// - [`DirectoryNotFound`](ErrorKind::DirectoryNotFound) if a segment has
    ///   no matching child directory.
    /// - [`RemoteError`](ErrorKind::RemoteError) if the remote refused a
    ///   listing; any transport or parse error of a listing is raised as-is.
    #[instrument(skip(self))]
    pub async fn resolve(&self, path: &str) -> Result<&TreeNode> {
        let mut node = &self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let listing = self.listing(node).await?;
            node = listing.dirs.get(segment).ok_or_raise(|| ErrorKind::DirectoryNotFound {
                segment: segment.to_string(),
                walked: node.path.clone(),
            })?;
        }
        Ok(node)
    }

    /// The files directly inside `node`, listing it first if required.
    pub async fn files<'a>(&'a self, node: &'a TreeNode) -> Result<&'a [FileEntry]> {
        Ok(&self.listing(node).await?.files)
    }

    async fn listing<'a>(&'a self, node: &'a TreeNode) -> Result<&'a Listing> {
        node.listing.get_or_try_init(|| self.fetch_listing(node)).await
    }

    #[instrument(skip(self, node), fields(path = %node.path))]
    async fn fetch_listing(&self, node: &TreeNode) -> Result<Listing> {
        let body = self.remote.list(&node.url).await?;
        let response: TreeResponse =
            serde_json::from_slice(&body).or_raise(|| ErrorKind::MalformedListing(node.path.clone()))?;
        let items = match (response.tree, response.message) {
            (Some(items), _) => items,
            (None, Some(message)) => exn::bail!(ErrorKind::RemoteError(message)),
            (None, None) => exn::bail!(ErrorKind::MalformedListing(node.path.clone())),
        };
        if response.truncated {
            tracing::warn!(path = %node.path, "Remote listing was truncated; some files will be missing");
        }

        let mut listing = Listing::default();
        for item in items {
            let path = node.join(&item.path);
            match item.kind {
                ItemKind::Blob => listing.files.push(FileEntry {
                    download_url: self.raw_url.replace(PATH_PLACEHOLDER, &path),
                    url: item.url.unwrap_or_default(),
                    path,
                    sha: item.sha,
                    size: item.size.unwrap_or(0),
                }),
                ItemKind::Tree => {
                    let Some(url) = item.url else {
                        exn::bail!(ErrorKind::MalformedListing(path));
                    };
                    listing.dirs.insert(item.path, TreeNode::stub(path, url));
                },
                ItemKind::Other => tracing::trace!(path = %path, "Skipping non-file, non-directory entry"),
            }
        }
        tracing::debug!(files = listing.files.len(), dirs = listing.dirs.len(), "Listed directory");
        Ok(listing)
    }
}
