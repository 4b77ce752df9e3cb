//! Error types for votekv
//!
//! Provides a unified error type for all ledger operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using VoteError
pub type Result<T> = std::result::Result<T, VoteError>;

/// Unified error type for votekv operations
#[derive(Debug, Error)]
pub enum VoteError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// The backing resource is missing, unreadable, unwritable or malformed
    #[error("Storage unavailable ({}): {reason}", .path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// The persisted text does not follow the catalog layout
    #[error("Format error: {0}")]
    Format(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    /// Exclusive access was not obtained within the retry budget
    #[error("Lock timeout on {resource} after {attempts} attempts")]
    LockTimeout { resource: String, attempts: u32 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),
}

impl VoteError {
    /// Wrap any failure touching the backing resource as `StorageUnavailable`.
    ///
    /// Lock timeouts and unknown items pass through unchanged so callers can
    /// still tell them apart.
    pub fn storage(path: &Path, err: VoteError) -> Self {
        match err {
            VoteError::StorageUnavailable { .. }
            | VoteError::LockTimeout { .. }
            | VoteError::ItemNotFound(_) => err,
            other => VoteError::StorageUnavailable {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        }
    }

    /// True for transient failures a caller may retry later
    pub fn is_busy(&self) -> bool {
        matches!(self, VoteError::LockTimeout { .. })
    }
}
