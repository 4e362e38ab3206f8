//! Keeps every write underneath the output directory.
//!
//! Sprite file names come from the name table, which is user-supplied JSON,
//! so a relative path is only trusted after [`validate`] has folded it down.

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Why [`validate`] refused a path.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[display("contains a NUL byte")]
    Nul,
    #[display("climbs above the output directory")]
    Escapes,
    #[display("carries a drive or UNC prefix")]
    Prefixed,
    #[display("names nothing")]
    Empty,
}

fn fold(path: &Path) -> std::result::Result<PathBuf, Rejection> {
    let mut kept: Vec<&OsStr> = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) => return Err(Rejection::Prefixed),
            Component::RootDir | Component::CurDir => {},
            Component::ParentDir => {
                kept.pop().ok_or(Rejection::Escapes)?;
            },
            // The kernel would silently truncate at the NUL.
            Component::Normal(part) if part.as_encoded_bytes().contains(&0) => return Err(Rejection::Nul),
            Component::Normal(part) => kept.push(part),
        }
    }
    match kept.is_empty() {
        true => Err(Rejection::Empty),
        false => Ok(kept.into_iter().collect()),
    }
}

/// Resolve `.` and `..` lexically and return the remaining relative path.
///
/// A leading `/` is dropped rather than rejected, so `/normal/mew.png` lands
/// at `normal/mew.png` inside the root. Symlinks are not followed.
///
/// ```
/// use std::path::Path;
/// use spritesync_storage::validate_path;
///
/// assert_eq!(validate_path("shiny/../normal/./mew.png").unwrap(), Path::new("normal/mew.png"));
/// assert!(validate_path("normal/../../mew.png").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    Ok(fold(path).map_err(|reason| ErrorKind::InvalidPath { path: path.to_path_buf(), reason })?)
}
