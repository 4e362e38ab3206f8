use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Why a sprite couldn't be turned into an icon.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not an image we can read. Don't retry with the same input.
    #[display("could not decode image")]
    Decode,
    /// Every pixel has alpha 0, so there is nothing to trim down to.
    #[display("image is fully transparent")]
    FullyTransparent,
    /// The requested scale factor is unusable for this image.
    #[display("invalid scale: {_0}")]
    InvalidScale(#[error(not(source))] String),
    /// Writing the output image failed.
    #[display("could not encode image")]
    Encode,
}
