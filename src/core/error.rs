use std::time::Duration;

use crate::storage::StorageError;

/// Errors surfaced by the write coordinator and the result side.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("index I/O error: {0}")]
    IndexIo(#[from] StorageError),

    #[error("unique key missing: document has no value for field '{0}'")]
    UniqueKeyMissing(String),

    #[error("timed out after {timeout:?} waiting for lock on {resource}")]
    LockTimeout { resource: String, timeout: Duration },

    #[error("result position {pos} out of range (0..{len})")]
    OutOfRangeResult { pos: usize, len: usize },

    #[error("search error: {0}")]
    Search(#[source] Box<Error>),

    #[error("batch failed after {committed} documents committed: {cause}")]
    BatchFailed {
        committed: usize,
        #[source]
        cause: Box<Error>,
    },

    #[error("batch did not drain within {timeout:?} ({committed} documents committed)")]
    BatchTimeout { committed: usize, timeout: Duration },

    #[error("analyzer '{0}' not found")]
    AnalyzerNotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Wraps a failure raised while materializing a result document.
    pub fn search(err: Error) -> Self {
        match err {
            Error::Search(_) => err,
            other => Error::Search(Box::new(other)),
        }
    }

    /// The failure behind a batch or search wrapper, or `self`.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Search(inner) => inner.root_cause(),
            Error::BatchFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_lock_timeout(&self) -> bool {
        matches!(self.root_cause(), Error::LockTimeout { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IndexIo(StorageError::Io(err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::IndexIo(StorageError::Codec(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
