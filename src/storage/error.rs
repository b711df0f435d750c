use std::path::PathBuf;

/// Failures raised by a storage directory
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("corrupt checkpoint {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("writer is closed")]
    WriterClosed,

    #[error("reader is closed")]
    ReaderClosed,
}
