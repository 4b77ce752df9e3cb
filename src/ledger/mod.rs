//! Ledger Module
//!
//! Durable, serialized storage of the vote catalog.
//!
//! ## Responsibilities
//! - Read the full catalog from its backing file
//! - Apply one vote as an atomic read → mutate → persist cycle
//! - Exclude every other mutator of the same file, in or out of process
//!
//! ## On-Disk Layout
//! ```text
//! {dir}/
//!   ├── cars.csv          catalog (replaced by rename on every commit)
//!   ├── cars.csv.lock     advisory lock target, last holder pid inside
//!   └── .tmpXXXXXX        in-flight replacement, renamed or removed
//! ```

mod lock;
mod store;

pub use lock::{FileLock, LockGuard, LOCK_SUFFIX};
pub use store::LedgerStore;
