use std::fs;
use std::io::Write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::error::Result;
use crate::storage::error::StorageError;
use crate::storage::layout::StorageLayout;
use crate::storage::segment::{IndexSegment, SegmentData};

const MAGIC: &[u8; 4] = b"SCKP";
const HEADER_LEN: usize = 8;

/// Last published generation of an on-disk index.
///
/// File layout: `SCKP` magic, CRC32 of the payload (LE), bincode payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub generation: u64,
    pub timestamp: DateTime<Utc>,
    pub segment: SegmentData,
}

impl Checkpoint {
    pub const VERSION: u32 = 1;

    pub fn new(generation: u64, segment: &IndexSegment) -> Self {
        Checkpoint {
            version: Self::VERSION,
            generation,
            timestamp: Utc::now(),
            segment: segment.to_data(),
        }
    }

    /// Load checkpoint from disk
    pub fn load(storage: &StorageLayout) -> Result<Option<Self>> {
        let path = storage.checkpoint_path();
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        let corrupt = |reason: &str| StorageError::Corrupt {
            path: path.clone(),
            reason: reason.to_string(),
        };

        if data.len() < HEADER_LEN || &data[..4] != MAGIC {
            return Err(corrupt("bad header").into());
        }
        let mut crc = [0u8; 4];
        crc.copy_from_slice(&data[4..HEADER_LEN]);
        let payload = &data[HEADER_LEN..];
        if crc32fast::hash(payload) != u32::from_le_bytes(crc) {
            return Err(corrupt("checksum mismatch").into());
        }

        let checkpoint: Checkpoint = bincode::deserialize(payload)?;
        if checkpoint.version > Self::VERSION {
            return Err(corrupt("unsupported version").into());
        }
        Ok(Some(checkpoint))
    }

    /// Save checkpoint to disk; the previous one stays intact until the
    /// rename succeeds.
    pub fn save(&self, storage: &StorageLayout) -> Result<()> {
        let payload = bincode::serialize(self)?;
        let tmp = storage.checkpoint_tmp_path();

        let mut file = fs::File::create(&tmp)?;
        file.write_all(MAGIC)?;
        file.write_all(&crc32fast::hash(&payload).to_le_bytes())?;
        file.write_all(&payload)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, storage.checkpoint_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path()).unwrap();
        assert!(Checkpoint::load(&layout).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path()).unwrap();

        Checkpoint::new(7, &IndexSegment::default()).save(&layout).unwrap();
        let loaded = Checkpoint::load(&layout).unwrap().unwrap();
        assert_eq!(loaded.generation, 7);
        assert!(!layout.checkpoint_tmp_path().exists());
    }

    #[test]
    fn test_flipped_byte_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path()).unwrap();
        Checkpoint::new(1, &IndexSegment::default()).save(&layout).unwrap();

        let mut bytes = fs::read(layout.checkpoint_path()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(layout.checkpoint_path(), bytes).unwrap();

        assert!(matches!(
            Checkpoint::load(&layout),
            Err(Error::IndexIo(StorageError::Corrupt { .. }))
        ));
    }
}
