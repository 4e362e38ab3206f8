//! Pipeline Error Types
//!
//! Everything raised here is fatal to the run. Problems that only affect a
//! single sprite are [`Failure`](crate::Failure)s instead, and are reported
//! rather than propagated.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fatal pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a fatal failure.
///
/// ### Dependency Errors
/// - [`ErrorKind::Remote`]
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Imaging`]
///
/// ### Operational Errors
/// - [`ErrorKind::NameTable`]
/// - [`ErrorKind::Task`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A target directory could not be resolved or listed.
    #[display("could not resolve remote directory")]
    Remote,
    /// The destination rejected a directory or file.
    #[display("could not write to destination")]
    Storage,
    /// Scaling or encoding a sprite that had already decoded and trimmed.
    #[display("could not scale or encode image")]
    Imaging,
    #[display("could not load name table from {}", _0.display())]
    NameTable(#[error(not(source))] PathBuf),
    /// A blocking image task panicked or was cancelled.
    #[display("image task did not complete")]
    Task,
}
