//! Response bodies
//!
//! JSON shapes returned by the HTTP endpoints.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::coordinator::RequestError;

/// Message sent with every successful vote
pub const VOTE_MESSAGE: &str = "Vote updated successfully";

/// Seconds a busy client is told to wait before retrying
pub const RETRY_AFTER_SECS: u64 = 1;

/// Body of a successful vote
#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub message: String,
    pub cars: Catalog,
}

/// Body of every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl From<&RequestError> for ErrorBody {
    fn from(err: &RequestError) -> Self {
        Self {
            error: err.error().to_string(),
            details: err.details(),
        }
    }
}

/// HTTP status for each outcome
pub fn status_for(err: &RequestError) -> StatusCode {
    match err {
        RequestError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RequestError::NotFound { .. } => StatusCode::NOT_FOUND,
        RequestError::ServerFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = Json(ErrorBody::from(&self));

        if self.is_busy() {
            let retry_after = RETRY_AFTER_SECS.to_string();
            return (status, [(header::RETRY_AFTER, retry_after)], body).into_response();
        }

        (status, body).into_response()
    }
}
