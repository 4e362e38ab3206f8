use crate::path::Rejection;
use derive_more::{Display, Error};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Ways the output directory can let a run down.
///
/// Any of these aborts the run: a destination that can't take one sprite
/// won't take the next one either.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("{} does not exist", _0.display())]
    Missing(#[error(not(source))] PathBuf),
    #[display("not allowed to touch {}", _0.display())]
    Denied(#[error(not(source))] PathBuf),
    #[display("refusing path {}: {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: Rejection },
    /// The configured root is relative, or exists but isn't a directory.
    #[display("{} can't be used as an output directory", _0.display())]
    InvalidRoot(#[error(not(source))] PathBuf),
    #[display("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: IoError },
}

impl ErrorKind {
    /// Classify an I/O failure on `path`, which should be the caller's
    /// relative path rather than the joined one.
    pub(crate) fn io(path: &Path, source: IoError) -> Self {
        match source.kind() {
            IoErrorKind::NotFound => Self::Missing(path.to_path_buf()),
            IoErrorKind::PermissionDenied | IoErrorKind::ReadOnlyFilesystem => Self::Denied(path.to_path_buf()),
            _ => Self::Io { path: path.to_path_buf(), source },
        }
    }
}
