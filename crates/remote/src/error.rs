//! Remote Error Types

use derive_more::{Display, Error};

/// A remote error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// While resolving the tree every one of these is fatal: the remote source is
/// unusable for every subsequent lookup too. While downloading a single file
/// they only fail that file.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The server answered with a non-success status code.
    #[display("unexpected status {status} from {url}")]
    Status {
        status: u16,
        url: String,
    },
    /// The remote explicitly signalled an error (rate limiting, bad sha, ...).
    #[display("remote error: {_0}")]
    RemoteError(#[error(not(source))] String),
    /// The listing payload could not be understood.
    #[display("malformed listing for '{_0}'")]
    MalformedListing(#[error(not(source))] String),
    /// A path segment has no matching child directory.
    #[display("directory '{segment}' not found under '/{walked}'")]
    DirectoryNotFound {
        /// The segment that could not be resolved.
        segment: String,
        /// The path walked so far, not including `segment`.
        walked: String,
    },
    /// The HTTP client could not be constructed.
    #[display("invalid client configuration: {_0}")]
    Client(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
