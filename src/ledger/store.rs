//! Ledger Store
//!
//! Sole owner of the persisted catalog file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::catalog::{decode_catalog, encode_catalog, Catalog};
use crate::config::{Config, UnknownItemPolicy};
use crate::coordinator::VotePhase;
use crate::error::{Result, VoteError};

use super::{FileLock, LockGuard};

/// Serialized, durable access to one catalog file
///
/// ## Concurrency Model
///
/// - **Increments**: strictly serialized
///   - Callers in this process queue on `writer` (bounded wait)
///   - The holder then takes the file lock, which also excludes other
///     processes sharing the same file
///   - Both are held across load → mutate → persist
///   - The queue is held a little longer, through `on_commit`, so commits
///     of this process are published in the order they were made
///
/// - **Reads**: unlocked
///   - Persistence replaces the file by rename, so a reader sees either
///     the previous or the next catalog, never a partial one
pub struct LedgerStore {
    /// Catalog file
    path: PathBuf,

    /// Cross-process exclusive lock on `path`
    lock: FileLock,

    /// Queue for mutators inside this process
    writer: Mutex<()>,

    /// Behaviour for votes on unknown ids
    unknown_item_policy: UnknownItemPolicy,
}

impl LedgerStore {
    /// Open a store for the configured file
    ///
    /// The file is not touched until the first read or increment.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            path: config.data_file.clone(),
            lock: FileLock::for_resource(&config.data_file, config.lock_retry),
            writer: Mutex::new(()),
            unknown_item_policy: config.unknown_item_policy,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified catalog file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_file(path).build();
        Self::open(&config)
    }

    /// Load the current catalog
    ///
    /// Takes no lock; fails with `StorageUnavailable` if the file is missing,
    /// unreadable or malformed.
    pub fn read_all(&self) -> Result<Catalog> {
        self.load()
    }

    /// Add one vote to `item_id` and persist the whole catalog
    ///
    /// Returns the catalog exactly as persisted.
    pub fn increment(&self, item_id: &str) -> Result<Catalog> {
        self.increment_observed(item_id, |_| {})
    }

    /// `increment`, reporting each phase it enters to `on_phase`
    ///
    /// Steps:
    /// 1. AcquiringLock: queue in-process, then take the file lock
    /// 2. Mutating: load the catalog and apply the vote
    /// 3. Persisting: write-then-rename the full catalog
    ///
    /// Both locks are released before this returns, on success or failure.
    pub fn increment_observed<F>(&self, item_id: &str, on_phase: F) -> Result<Catalog>
    where
        F: FnMut(VotePhase),
    {
        self.increment_then(item_id, on_phase, |catalog| catalog)
    }

    /// `increment_observed`, handing the persisted catalog to `on_commit`
    ///
    /// `on_commit` runs once the file lock is released but while this
    /// process's writer queue is still held. Whatever it publishes therefore
    /// leaves in commit order. It must not block.
    pub fn increment_then<F, C, R>(
        &self,
        item_id: &str,
        mut on_phase: F,
        on_commit: C,
    ) -> Result<R>
    where
        F: FnMut(VotePhase),
        C: FnOnce(Catalog) -> R,
    {
        on_phase(VotePhase::AcquiringLock);
        let _queue = self.enter_writer()?;

        let catalog = {
            let _lock = self.acquire_lock()?;
            self.apply_vote(item_id, &mut on_phase)?
        };

        Ok(on_commit(catalog))
    }

    /// Write `catalog` if the file does not exist yet
    ///
    /// Returns whether anything was written. An existing file is never
    /// replaced.
    pub fn initialize(&self, catalog: &Catalog) -> Result<bool> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).map_err(|e| VoteError::storage(&self.path, e.into()))?;
        }

        let _queue = self.enter_writer()?;
        let _lock = self.acquire_lock()?;

        if self.path.exists() {
            return Ok(false);
        }

        self.persist(catalog)?;
        tracing::info!(
            "Initialized {} with {} items",
            self.path.display(),
            catalog.len()
        );
        Ok(true)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the catalog file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the lock guarding the catalog file
    pub fn lock(&self) -> &FileLock {
        &self.lock
    }

    pub fn unknown_item_policy(&self) -> UnknownItemPolicy {
        self.unknown_item_policy
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Load, vote, persist. Caller holds both locks.
    fn apply_vote<F>(&self, item_id: &str, on_phase: &mut F) -> Result<Catalog>
    where
        F: FnMut(VotePhase),
    {
        on_phase(VotePhase::Mutating);
        let mut catalog = self.load()?;
        let matched = catalog
            .record_vote(item_id)
            .map_err(|e| VoteError::storage(&self.path, e))?;

        if !matched {
            match self.unknown_item_policy {
                UnknownItemPolicy::Reject => {
                    return Err(VoteError::ItemNotFound(item_id.to_string()));
                }
                UnknownItemPolicy::Persist => {
                    tracing::warn!(
                        "Vote for unknown item '{}' in {}; persisting catalog unchanged",
                        item_id,
                        self.path.display()
                    );
                }
            }
        }

        on_phase(VotePhase::Persisting);
        self.persist(&catalog)?;

        tracing::debug!(
            "Committed vote for '{}' in {} ({} items)",
            item_id,
            self.path.display(),
            catalog.len()
        );

        Ok(catalog)
    }

    fn enter_writer(&self) -> Result<parking_lot::MutexGuard<'_, ()>> {
        let policy = self.lock.policy();

        self.writer
            .try_lock_for(policy.budget())
            .ok_or_else(|| VoteError::LockTimeout {
                resource: self.path.display().to_string(),
                attempts: policy.attempts(),
            })
    }

    fn acquire_lock(&self) -> Result<LockGuard> {
        self.lock
            .acquire()
            .map_err(|e| VoteError::storage(&self.path, e))
    }

    fn load(&self) -> Result<Catalog> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| VoteError::storage(&self.path, e.into()))?;

        decode_catalog(&text).map_err(|e| VoteError::storage(&self.path, e))
    }

    /// Replace the file atomically: temp file in the same directory, fsync,
    /// rename over the target. The temp file is removed on any failure.
    fn persist(&self, catalog: &Catalog) -> Result<()> {
        let text = encode_catalog(catalog).map_err(|e| VoteError::storage(&self.path, e))?;

        self.write_replace(text.as_bytes())
            .map_err(|e| VoteError::storage(&self.path, e.into()))
    }

    fn write_replace(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;

        // Keep the mode of the file being replaced
        match fs::metadata(&self.path) {
            Ok(meta) => tmp.as_file().set_permissions(meta.permissions())?,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}
