//! # votekv
//!
//! A concurrent vote ledger with:
//! - Serialized increments with no lost updates
//! - A cross-process named lock with bounded retries
//! - Atomic whole-file persistence (write, fsync, rename)
//! - Live broadcast of every committed catalog
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 HTTP Server (axum)                           │
//! │        GET /api/cars  POST /api/cars/:id/vote  SSE           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                Request Coordinator                           │
//! │      lock → read → mutate → persist → release → notify       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Ledger    │          │  Notifier   │
//!   │ (FileLock)  │          │ (observers) │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │  cars.csv   │
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod catalog;
pub mod ledger;
pub mod notifier;
pub mod coordinator;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use catalog::{Catalog, ItemRecord};
pub use config::{Config, RetryPolicy, UnknownItemPolicy};
pub use coordinator::{Coordinator, RequestError};
pub use error::{Result, VoteError};
pub use ledger::LedgerStore;
pub use notifier::ChangeNotifier;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of votekv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse an `ID=IMAGE` pair into a fresh record with no votes
///
/// Shared by the binaries' seeding options.
pub fn parse_seed_item(entry: &str) -> Result<ItemRecord> {
    let (id, image_ref) = entry
        .split_once('=')
        .ok_or_else(|| VoteError::Config(format!("expected ID=IMAGE, got '{}'", entry)))?;

    let id = id.trim();
    if id.is_empty() {
        return Err(VoteError::Config(format!("empty id in '{}'", entry)));
    }

    Ok(ItemRecord::new(id, 0, image_ref.trim()))
}
