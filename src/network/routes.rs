//! Request handlers
//!
//! The ledger is blocking, so every call into the coordinator runs on the
//! blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tokio::task::JoinError;

use crate::catalog::Catalog;
use crate::coordinator::{RequestError, READ_FAILED, VOTE_FAILED};

use super::response::{VoteResponse, VOTE_MESSAGE};
use super::AppState;

pub const WELCOME: &str = "Welcome to the Favorite Car Backend!";

pub async fn welcome_handler() -> &'static str {
    WELCOME
}

/// `GET /api/cars`
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Catalog>, RequestError> {
    let coordinator = Arc::clone(&state.coordinator);

    let catalog = tokio::task::spawn_blocking(move || coordinator.handle_read_request())
        .await
        .map_err(|e| task_failed(e, READ_FAILED))??;

    Ok(Json(catalog))
}

/// `POST /api/cars/:id/vote`
pub async fn vote_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<VoteResponse>, RequestError> {
    let coordinator = Arc::clone(&state.coordinator);

    let snapshot =
        tokio::task::spawn_blocking(move || coordinator.handle_vote_request(&item_id))
            .await
            .map_err(|e| task_failed(e, VOTE_FAILED))??;

    Ok(Json(VoteResponse {
        message: VOTE_MESSAGE.to_string(),
        cars: Catalog::clone(&snapshot),
    }))
}

fn task_failed(err: JoinError, error: &'static str) -> RequestError {
    tracing::error!("Ledger task failed: {}", err);
    RequestError::ServerFault {
        error,
        details: err.to_string(),
    }
}
