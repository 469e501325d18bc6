use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("invalid umask: {0:#o}")]
    InvalidUmask(u32),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// The OS error kind behind an `Io` error, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
