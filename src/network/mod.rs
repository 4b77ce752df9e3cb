//! Network Module
//!
//! HTTP surface of the ledger.
//!
//! ## Routes
//! - `GET  /`                   welcome banner
//! - `GET  /api/cars`           full catalog
//! - `POST /api/cars/:id/vote`  cast one vote
//! - `GET  /api/events`         server-sent `updateCars` events
//!
//! ## Status Codes
//! - 200: success
//! - 404: unknown item (only when unknown votes are rejected)
//! - 500: storage fault, body `{error, details}`
//! - 503: ledger busy, body `{error, details}`, `Retry-After` set

mod events;
mod response;
mod routes;
mod server;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::{Result, VoteError};

pub use events::{snapshot_event, UPDATE_EVENT};
pub use response::{status_for, ErrorBody, VoteResponse, RETRY_AFTER_SECS, VOTE_MESSAGE};
pub use routes::WELCOME;
pub use server::Server;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub keep_alive: Duration,
}

/// Build the application router
pub fn router(config: &Config, coordinator: Arc<Coordinator>) -> Result<Router> {
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        VoteError::Config(format!("invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let state = AppState {
        coordinator,
        keep_alive: Duration::from_secs(config.keep_alive_secs.max(1)),
    };

    Ok(Router::new()
        .route("/", get(routes::welcome_handler))
        .route("/api/cars", get(routes::list_handler))
        .route("/api/cars/:id/vote", post(routes::vote_handler))
        .route("/api/events", get(events::events_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
