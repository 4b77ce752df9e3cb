//! Caller-visible request outcomes

use thiserror::Error;

use crate::error::VoteError;

/// Message for a failed catalog read
pub const READ_FAILED: &str = "Error reading car data";

/// Message for a failed vote
pub const VOTE_FAILED: &str = "Error updating car data";

/// Message for a vote refused because the ledger is busy
pub const LEDGER_BUSY: &str = "Vote ledger is busy, please retry";

/// Message for a vote on an unknown item
pub const ITEM_NOT_FOUND: &str = "Car not found";

/// Why a request did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Transient contention; retrying later may succeed
    #[error("Vote ledger is busy, please retry: {details}")]
    Busy { details: String },

    /// The vote named an id absent from the catalog
    #[error("Car not found: {item_id}")]
    NotFound { item_id: String },

    /// Storage failed; retrying will not help until it is fixed
    #[error("{error}: {details}")]
    ServerFault { error: &'static str, details: String },
}

impl RequestError {
    /// Classify a ledger failure for the operation described by `error`
    pub fn from_vote_error(err: VoteError, error: &'static str) -> Self {
        match err {
            VoteError::LockTimeout { .. } => RequestError::Busy {
                details: err.to_string(),
            },
            VoteError::ItemNotFound(item_id) => RequestError::NotFound { item_id },
            other => RequestError::ServerFault {
                error,
                details: other.to_string(),
            },
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, RequestError::Busy { .. })
    }

    /// Short machine-readable message
    pub fn error(&self) -> &'static str {
        match self {
            RequestError::Busy { .. } => LEDGER_BUSY,
            RequestError::NotFound { .. } => ITEM_NOT_FOUND,
            RequestError::ServerFault { error, .. } => error,
        }
    }

    /// Underlying cause, for the `details` field of error bodies
    pub fn details(&self) -> String {
        match self {
            RequestError::Busy { details } | RequestError::ServerFault { details, .. } => {
                details.clone()
            }
            RequestError::NotFound { item_id } => format!("no item with id '{}'", item_id),
        }
    }
}
