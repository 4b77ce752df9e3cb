//! Request Coordinator
//!
//! Turns one external request into ledger calls plus, for votes, a broadcast.

use std::cell::RefCell;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::ledger::LedgerStore;
use crate::notifier::ChangeNotifier;

use super::outcome::{RequestError, READ_FAILED, VOTE_FAILED};
use super::state::{VotePhase, VoteTracker};

/// Entry point for the read and vote operations
///
/// Votes are never retried here. The lock's own retry budget is the only
/// retry layer; a `Busy` outcome goes back to the caller.
pub struct Coordinator {
    store: LedgerStore,
    notifier: ChangeNotifier,
}

impl Coordinator {
    pub fn new(store: LedgerStore, notifier: ChangeNotifier) -> Self {
        Self { store, notifier }
    }

    /// Return the full current catalog
    pub fn handle_read_request(&self) -> Result<Catalog, RequestError> {
        self.store.read_all().map_err(|e| {
            tracing::error!("Read of {} failed: {}", self.store.path().display(), e);
            RequestError::from_vote_error(e, READ_FAILED)
        })
    }

    /// Cast one vote for `item_id`
    ///
    /// On success the committed catalog is broadcast before it is returned,
    /// and the returned snapshot is the same value observers received.
    /// Votes handled by one coordinator are broadcast in commit order.
    pub fn handle_vote_request(&self, item_id: &str) -> Result<Arc<Catalog>, RequestError> {
        self.handle_vote_request_traced(item_id).0
    }

    /// `handle_vote_request`, also returning the phases the request went through
    pub fn handle_vote_request_traced(
        &self,
        item_id: &str,
    ) -> (Result<Arc<Catalog>, RequestError>, VoteTracker) {
        let tracker = RefCell::new(VoteTracker::new(item_id));

        // Broadcast inside the store's commit hook so snapshots leave in
        // commit order; the file lock is already released at that point.
        let committed = self.store.increment_then(
            item_id,
            |phase| self.advance(&mut tracker.borrow_mut(), phase),
            |catalog| {
                let snapshot = Arc::new(catalog);
                self.advance(&mut tracker.borrow_mut(), VotePhase::Notifying);
                let report = self.notifier.broadcast(Arc::clone(&snapshot));
                self.advance(&mut tracker.borrow_mut(), VotePhase::Done);
                (snapshot, report)
            },
        );
        let mut tracker = tracker.into_inner();

        let (snapshot, report) = match committed {
            Ok(published) => published,
            Err(e) => {
                if let Err(transition) = tracker.abort() {
                    tracing::error!("{}", transition);
                }

                let outcome = RequestError::from_vote_error(e, VOTE_FAILED);
                if outcome.is_busy() {
                    tracing::warn!("Vote for '{}' refused: {}", item_id, outcome);
                } else {
                    tracing::error!("Vote for '{}' failed: {}", item_id, outcome);
                }
                return (Err(outcome), tracker);
            }
        };

        tracing::info!(
            "Vote for '{}' committed, broadcast to {} observers",
            item_id,
            report.delivered
        );

        (Ok(snapshot), tracker)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn advance(&self, tracker: &mut VoteTracker, phase: VotePhase) {
        if let Err(e) = tracker.advance(phase) {
            tracing::error!("{}", e);
        }
    }
}
