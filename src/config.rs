//! Configuration for votekv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, VoteError};

/// Main configuration for a votekv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The catalog file. Its lock lives next to it:
    ///   {dir}/
    ///     ├── cars.csv        (catalog)
    ///     └── cars.csv.lock   (exclusive lock, present only while held)
    pub data_file: PathBuf,

    /// What a vote for an id with no matching record does
    pub unknown_item_policy: UnknownItemPolicy,

    // -------------------------------------------------------------------------
    // Lock Configuration
    // -------------------------------------------------------------------------
    /// Bounded retry policy for acquiring the exclusive lock
    pub lock_retry: RetryPolicy,

    // -------------------------------------------------------------------------
    // Notifier Configuration
    // -------------------------------------------------------------------------
    /// Per-observer buffer of undelivered snapshots
    pub observer_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Origin allowed by CORS
    pub cors_origin: String,

    /// Interval between keep-alive comments on the event channel (seconds)
    pub keep_alive_secs: u64,
}

/// Lock acquisition policy: a fixed number of attempts with a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,

    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Total number of attempts, including the first
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Longest time an acquisition may wait before giving up
    pub fn budget(&self) -> Duration {
        self.delay.saturating_mul(self.retries)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(100))
    }
}

/// Behaviour when a vote names an id absent from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownItemPolicy {
    /// Persist the unchanged catalog and report success
    #[default]
    Persist,

    /// Fail with `ItemNotFound` without writing
    Reject,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./public/data/cars.csv"),
            unknown_item_policy: UnknownItemPolicy::Persist,
            lock_retry: RetryPolicy::default(),
            observer_capacity: 16,
            listen_addr: "127.0.0.1:3000".to_string(),
            cors_origin: "http://localhost:4200".to_string(),
            keep_alive_secs: 15,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the ledger cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(VoteError::Config("data file path is empty".to_string()));
        }
        if self.lock_retry.retries == 0 {
            return Err(VoteError::Config(
                "lock retry count must be at least 1".to_string(),
            ));
        }
        if self.observer_capacity == 0 {
            return Err(VoteError::Config(
                "observer capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the catalog file path
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    /// Set the unknown item policy
    pub fn unknown_item_policy(mut self, policy: UnknownItemPolicy) -> Self {
        self.config.unknown_item_policy = policy;
        self
    }

    /// Set the lock retry policy
    pub fn lock_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.lock_retry = policy;
        self
    }

    /// Set the per-observer buffer size
    pub fn observer_capacity(mut self, capacity: usize) -> Self {
        self.config.observer_capacity = capacity;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the CORS origin
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_origin = origin.into();
        self
    }

    /// Set the event channel keep-alive interval (in seconds)
    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.config.keep_alive_secs = secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
