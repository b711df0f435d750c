use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::Result;

/// Files of an on-disk index directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(StorageLayout { base_dir })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(".lock")
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.base_dir.join("checkpoint.bin")
    }

    /// Written first, then renamed over the checkpoint.
    pub fn checkpoint_tmp_path(&self) -> PathBuf {
        self.base_dir.join("checkpoint.bin.tmp")
    }
}
