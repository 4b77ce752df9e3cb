//! Change event channel
//!
//! Server-sent events. Each connection is one observer of the notifier;
//! every committed catalog arrives as an `updateCars` event with the JSON
//! catalog as data.

use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::notifier::{ChangeNotifier, ObserverId};

use super::AppState;

/// Event name carrying catalog snapshots
pub const UPDATE_EVENT: &str = "updateCars";

/// One open event stream; detaches its observer when the client goes away
struct EventConnection {
    id: ObserverId,
    notifier: ChangeNotifier,
    receiver: mpsc::Receiver<Arc<Catalog>>,
}

impl Drop for EventConnection {
    fn drop(&mut self) {
        self.notifier.detach(self.id);
        tracing::info!("Event subscriber {} disconnected", self.id);
    }
}

/// `GET /api/events`
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let notifier = state.coordinator.notifier().clone();

    let (sender, receiver) = mpsc::channel(notifier.capacity());
    let id = notifier.attach(Box::new(sender));
    tracing::info!("Event subscriber {} connected", id);

    let connection = EventConnection {
        id,
        notifier,
        receiver,
    };

    let events = stream::unfold(connection, |mut connection| async move {
        let snapshot = connection.receiver.recv().await?;
        Some((snapshot_event(&snapshot), connection))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(state.keep_alive))
}

/// Encode one snapshot as an `updateCars` event
pub fn snapshot_event(snapshot: &Catalog) -> Result<Event, axum::Error> {
    Event::default().event(UPDATE_EVENT).json_data(snapshot)
}
