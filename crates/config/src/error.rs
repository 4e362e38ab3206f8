//! Configuration Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source could not be read or did not match the
    /// expected shape.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// A value was read fine but is unusable.
    #[display("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ErrorKind {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
