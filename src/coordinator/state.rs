//! Vote request state machine
//!
//! ```text
//! Idle → AcquiringLock → Mutating → Persisting → Notifying → Done
//!              │             │           │
//!              └─────────────┴───────────┴──────→ Aborted
//! ```

use std::fmt;

use thiserror::Error;

/// Phase of a single vote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VotePhase {
    Idle,
    AcquiringLock,
    Mutating,
    Persisting,
    Notifying,
    Done,
    Aborted,
}

impl VotePhase {
    /// `Done` and `Aborted` end the request
    pub fn is_terminal(self) -> bool {
        matches!(self, VotePhase::Done | VotePhase::Aborted)
    }

    /// Whether the machine may move from `self` to `next`
    pub fn can_advance_to(self, next: VotePhase) -> bool {
        use VotePhase::*;

        matches!(
            (self, next),
            (Idle, AcquiringLock)
                | (AcquiringLock, Mutating)
                | (Mutating, Persisting)
                | (Persisting, Notifying)
                | (Notifying, Done)
                | (AcquiringLock, Aborted)
                | (Mutating, Aborted)
                | (Persisting, Aborted)
        )
    }
}

impl fmt::Display for VotePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid vote transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: VotePhase,
    pub to: VotePhase,
}

/// Walks one request through the machine exactly once
#[derive(Debug, Clone)]
pub struct VoteTracker {
    item_id: String,
    history: Vec<VotePhase>,
}

impl VoteTracker {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            history: vec![VotePhase::Idle],
        }
    }

    pub fn phase(&self) -> VotePhase {
        self.history.last().copied().unwrap_or(VotePhase::Idle)
    }

    /// Move to `next`, refusing re-entry and skipped phases
    pub fn advance(&mut self, next: VotePhase) -> Result<(), InvalidTransition> {
        let from = self.phase();
        if !from.can_advance_to(next) {
            return Err(InvalidTransition { from, to: next });
        }

        tracing::trace!("vote '{}': {} -> {}", self.item_id, from, next);
        self.history.push(next);
        Ok(())
    }

    /// Enter `Aborted` from whichever phase failed
    pub fn abort(&mut self) -> Result<(), InvalidTransition> {
        self.advance(VotePhase::Aborted)
    }

    /// Every phase visited, starting with `Idle`
    pub fn history(&self) -> &[VotePhase] {
        &self.history
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}
