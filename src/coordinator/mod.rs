//! Coordinator Module
//!
//! Orchestrates one request end to end.
//!
//! ## Vote Flow
//! 1. Acquire exclusive access to the ledger
//! 2. Read the current catalog and apply the vote
//! 3. Persist and release access
//! 4. Broadcast the committed catalog
//! 5. Answer the caller with the same catalog
//!
//! Failures map to a `RequestError`: lock contention is `Busy` (retryable),
//! storage trouble is `ServerFault`.

mod handler;
mod outcome;
mod state;

pub use handler::Coordinator;
pub use outcome::{RequestError, ITEM_NOT_FOUND, LEDGER_BUSY, READ_FAILED, VOTE_FAILED};
pub use state::{InvalidTransition, VotePhase, VoteTracker};
