//! Change Notifier
//!
//! Publishes committed snapshots to the registry of connected observers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::catalog::Catalog;

use super::observer::{bounded, Delivery, Observer, Subscription};
use super::ObserverId;

/// Outcome counts of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub lagged: usize,
    pub pruned: usize,
}

/// Shared observer registry
pub(crate) struct Registry {
    /// Active observers in attach order
    observers: RwLock<Vec<(ObserverId, Box<dyn Observer>)>>,

    /// Next observer id (atomic, lock-free)
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);

        let removed = observers.len() < before;
        if removed {
            tracing::debug!("Observer {} detached ({} connected)", id, observers.len());
        }
        removed
    }
}

/// Fans committed catalogs out to every connected observer
///
/// Cheap to clone; clones share one registry. Publishing never waits on an
/// observer: full buffers drop that snapshot for that observer only, and
/// closed observers are pruned.
#[derive(Clone)]
pub struct ChangeNotifier {
    registry: Arc<Registry>,

    /// Buffer size for `subscribe`
    capacity: usize,
}

impl ChangeNotifier {
    /// Create a notifier whose subscriptions buffer `capacity` snapshots
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                observers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Register a custom observer
    pub fn attach(&self, observer: Box<dyn Observer>) -> ObserverId {
        let id = ObserverId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));

        let mut observers = self.registry.observers.write();
        observers.push((id, observer));
        tracing::debug!("Observer {} attached ({} connected)", id, observers.len());

        id
    }

    /// Remove an observer; returns whether it was registered
    pub fn detach(&self, id: ObserverId) -> bool {
        self.registry.remove(id)
    }

    /// Drop every observer, ending their channels
    pub fn detach_all(&self) -> usize {
        let mut observers = self.registry.observers.write();
        let count = observers.len();
        observers.clear();

        if count > 0 {
            tracing::debug!("Detached all {} observers", count);
        }
        count
    }

    /// Subscribe with a bounded channel of the default capacity
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(self.capacity)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let (sender, receiver) = bounded(capacity.max(1));
        let id = self.attach(Box::new(sender));

        Subscription {
            id,
            receiver,
            notifier: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `snapshot` to every observer connected right now
    pub fn broadcast(&self, snapshot: Arc<Catalog>) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        {
            let observers = self.registry.observers.read();
            for (id, observer) in observers.iter() {
                match observer.deliver(&snapshot) {
                    Delivery::Delivered => report.delivered += 1,
                    Delivery::Lagged => {
                        tracing::debug!("Observer {} lagging; snapshot dropped", id);
                        report.lagged += 1;
                    }
                    Delivery::Closed => closed.push(*id),
                }
            }
        }

        for id in closed {
            if self.registry.remove(id) {
                report.pruned += 1;
            }
        }

        tracing::trace!(
            "Broadcast {} items: {} delivered, {} lagged, {} pruned",
            snapshot.len(),
            report.delivered,
            report.lagged,
            report.pruned
        );

        report
    }

    /// Number of connected observers
    pub fn observer_count(&self) -> usize {
        self.registry.observers.read().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}
