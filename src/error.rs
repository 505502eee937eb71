//! Error types for locator resolution, fetching and snapshot reads.
//!
//! Defines `SourceError` for every failure a read can produce and implements
//! Axum's `IntoResponse` so the HTTP surface returns JSON error bodies.
//!
//! Error mappings:
//! - `LocatorMalformed`, `TransportUnsupported`, `AuthResolutionFailed` → 400
//! - `StatFailed`, not-found fetches, `RetryExhausted` → 404
//! - cancelled fetches → 504
//! - other fetch failures → 502
//! - everything else → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::git::FetchFailure;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("invalid locator: {0}")]
    LocatorMalformed(String),

    #[error("scheme {0} cannot be handled by git source support")]
    TransportUnsupported(String),

    #[error("can't resolve {transport} credentials: {reason}")]
    AuthResolutionFailed {
        transport: &'static str,
        reason: String,
    },

    #[error("git fetch for {locator} failed: {source}")]
    FetchFailed {
        locator: String,
        #[source]
        source: FetchFailure,
    },

    #[error("git fetch for {locator} failed after bare repository fallback: {source}")]
    RetryExhausted {
        locator: String,
        #[source]
        source: FetchFailure,
    },

    #[error("can't stat {path}: {source}")]
    StatFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't read dir {path}: {source}")]
    ReadDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("can't encode listing of {path}: {source}")]
    EncodeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SourceError {
    /// True when the failure came from the fetch step rather than from
    /// parsing or reading the snapshot.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            SourceError::FetchFailed { .. } | SourceError::RetryExhausted { .. }
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            SourceError::LocatorMalformed(_)
            | SourceError::TransportUnsupported(_)
            | SourceError::AuthResolutionFailed { .. } => StatusCode::BAD_REQUEST,
            SourceError::StatFailed { .. } | SourceError::RetryExhausted { .. } => {
                StatusCode::NOT_FOUND
            }
            SourceError::FetchFailed { source, .. } => match source {
                FetchFailure::RepositoryNotFound(_) => StatusCode::NOT_FOUND,
                FetchFailure::Cancelled => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SourceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
