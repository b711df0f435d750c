use std::fs::{File, OpenOptions};
use std::time::{Duration, Instant};
use crate::core::error::{Error, Result};
use crate::storage::layout::StorageLayout;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exclusive lock on an index directory's `.lock` file; released on drop.
#[derive(Debug)]
pub struct FileLock {
    pub file: File,
}

impl FileLock {
    /// Non-blocking attempt; `None` when another holder has the lock.
    pub fn try_acquire(storage: &StorageLayout) -> Result<Option<Self>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(storage.lock_path())?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            let rc = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    return Ok(None);
                }
                return Err(err.into());
            }
        }

        Ok(Some(FileLock { file }))
    }

    /// Polls until the lock is ours or `timeout` elapses.
    pub fn acquire(storage: &StorageLayout, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(lock) = Self::try_acquire(storage)? {
                return Ok(lock);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::LockTimeout {
                    resource: storage.lock_path().display().to_string(),
                    timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_second_holder_times_out_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path()).unwrap();

        let first = FileLock::try_acquire(&layout).unwrap().expect("lock is free");
        assert!(FileLock::try_acquire(&layout).unwrap().is_none());

        let err = FileLock::acquire(&layout, Duration::from_millis(50)).unwrap_err();
        assert!(err.is_lock_timeout());

        drop(first);
        assert!(FileLock::acquire(&layout, Duration::from_millis(50)).is_ok());
    }
}
