//! Named exclusive lock
//!
//! An advisory lock on a file next to the guarded resource. The lock file
//! itself is permanent; ownership is the OS-level exclusive lock on it, so
//! a holder that dies releases it with its descriptors.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::config::RetryPolicy;
use crate::error::{Result, VoteError};

/// Suffix appended to the resource path to name its lock
pub const LOCK_SUFFIX: &str = ".lock";

/// Exclusive lock scoped to one resource path
#[derive(Debug, Clone)]
pub struct FileLock {
    /// Path of the lock file (`<resource>.lock`)
    path: PathBuf,

    /// Acquisition policy
    policy: RetryPolicy,
}

/// Proof of ownership; unlocks when dropped
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Create the lock guarding `resource`
    pub fn for_resource(resource: &Path, policy: RetryPolicy) -> Self {
        let mut name = resource.as_os_str().to_os_string();
        name.push(LOCK_SUFFIX);

        Self {
            path: PathBuf::from(name),
            policy,
        }
    }

    /// Acquire the lock, retrying with a fixed delay
    ///
    /// Gives up with `LockTimeout` once every attempt of the policy failed.
    /// I/O failures other than contention are returned immediately.
    pub fn acquire(&self) -> Result<LockGuard> {
        let attempts = self.policy.attempts();

        for attempt in 1..=attempts {
            if let Some(guard) = self.try_acquire()? {
                if attempt > 1 {
                    tracing::debug!("Acquired {} on attempt {}", self.path.display(), attempt);
                }
                return Ok(guard);
            }

            if attempt < attempts {
                std::thread::sleep(self.policy.delay);
            }
        }

        Err(VoteError::LockTimeout {
            resource: self.path.display().to_string(),
            attempts,
        })
    }

    /// Single non-blocking attempt
    ///
    /// Returns `Ok(None)` while another holder owns the lock.
    pub fn try_acquire(&self) -> Result<Option<LockGuard>> {
        let mut file = self.open()?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        // Holder pid, for operators looking at a stuck lock
        if let Err(e) = record_holder(&mut file) {
            tracing::debug!("Could not record holder in {}: {}", self.path.display(), e);
        }

        Ok(Some(LockGuard {
            file,
            path: self.path.clone(),
        }))
    }

    /// Whether some holder currently owns the lock
    pub fn is_held(&self) -> bool {
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(file) => file,
            Err(_) => return false,
        };

        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = file.unlock();
                false
            }
            Err(e) => is_contended(&e),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
    }
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            // Closing the descriptor right after still releases it
            tracing::error!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn record_holder(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())
}
