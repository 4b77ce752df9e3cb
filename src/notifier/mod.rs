//! Notifier Module
//!
//! Best-effort fan-out of committed catalogs.
//!
//! ## Responsibilities
//! - Keep a registry of connected observers (attach / detach)
//! - Deliver each committed snapshot to every observer connected at that moment
//! - Never block or fail a publish because of a slow or vanished observer
//!
//! There is no replay: an observer sees only snapshots published after it
//! attached, and reads the initial state through the normal read path.

mod observer;
mod registry;

use std::fmt;

pub use observer::{Delivery, Observer, Subscription};
pub use registry::{BroadcastReport, ChangeNotifier};

/// Identity of an attached observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
