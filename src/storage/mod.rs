pub mod checkpoint;
pub mod directory;
pub mod document;
pub mod error;
pub mod file_lock;
pub mod layout;
pub mod local;
pub mod segment;

pub use directory::{FieldReader, IndexDirectory, IndexReaderHandle, IndexWriterHandle, OpenMode, WriterOptions};
pub use error::StorageError;
pub use local::LocalDirectory;
