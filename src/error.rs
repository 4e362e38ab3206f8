use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of the run gave up.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not set up the HTTP client")]
    Client,
    #[display("could not open the output directory")]
    Storage,
    #[display("could not load the name table")]
    Names,
    #[display("sync aborted")]
    Sync,
}
