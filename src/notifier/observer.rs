//! Observer handles
//!
//! Anything that can accept a snapshot without blocking.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use tokio::sync::mpsc;

use crate::catalog::Catalog;

/// Result of handing a snapshot to one observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the observer
    Delivered,

    /// Observer buffer full; this snapshot was dropped for it
    Lagged,

    /// Observer went away and should be removed
    Closed,
}

/// A connected subscriber of the change channel
///
/// `deliver` must never block: the notifier calls it for every observer
/// while publishing.
pub trait Observer: Send + Sync {
    fn deliver(&self, snapshot: &Arc<Catalog>) -> Delivery;
}

impl Observer for Sender<Arc<Catalog>> {
    fn deliver(&self, snapshot: &Arc<Catalog>) -> Delivery {
        match self.try_send(Arc::clone(snapshot)) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => Delivery::Lagged,
            Err(TrySendError::Disconnected(_)) => Delivery::Closed,
        }
    }
}

impl Observer for mpsc::Sender<Arc<Catalog>> {
    fn deliver(&self, snapshot: &Arc<Catalog>) -> Delivery {
        match self.try_send(Arc::clone(snapshot)) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Lagged,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Bounded channel pair used by `ChangeNotifier::subscribe`
pub(super) fn bounded(capacity: usize) -> (Sender<Arc<Catalog>>, Receiver<Arc<Catalog>>) {
    channel::bounded(capacity)
}

/// Receiving end of a subscription
///
/// Dropping it detaches the observer.
pub struct Subscription {
    pub(super) id: super::ObserverId,
    pub(super) receiver: Receiver<Arc<Catalog>>,
    pub(super) notifier: std::sync::Weak<super::registry::Registry>,
}

impl Subscription {
    pub fn id(&self) -> super::ObserverId {
        self.id
    }

    /// Block until the next snapshot; `None` once detached
    pub fn recv(&self) -> Option<Arc<Catalog>> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<Arc<Catalog>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<Arc<Catalog>> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Snapshots waiting to be received
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.notifier.upgrade() {
            registry.remove(self.id);
        }
    }
}
