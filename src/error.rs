use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::headers::ContentRange;
use axum_extra::TypedHeader;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::range::RangeError;

/// Everything that can end a streaming request.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("{0}")]
    BadRequest(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid range: {source}")]
    RangeNotSatisfiable {
        #[source]
        source: RangeError,
        size_bytes: u64,
    },

    #[error("Invalid video file: {key} is only {size_bytes} bytes")]
    InvalidPayload { key: String, size_bytes: u64 },

    #[error("Error retrieving file: {0}")]
    Upstream(#[source] GatewayError),

    /// Raised after the status line went out; only ever logged.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),
}

impl StreamError {
    /// Classifies a failed metadata lookup. Any failure there is reported as
    /// a missing object.
    pub fn from_lookup(key: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(_) => StreamError::NotFound(key.to_string()),
            other => StreamError::NotFound(format!("{key}: {other}")),
        }
    }

    /// Classifies a failed byte fetch.
    pub fn from_fetch(key: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(_) => StreamError::NotFound(key.to_string()),
            other => StreamError::Upstream(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StreamError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StreamError::NotFound(_) => StatusCode::NOT_FOUND,
            StreamError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            StreamError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StreamError::StreamInterrupted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        match self {
            StreamError::RangeNotSatisfiable { size_bytes, .. } => {
                let header = TypedHeader(ContentRange::unsatisfied_bytes(size_bytes));
                (status, header, message).into_response()
            }
            StreamError::StreamInterrupted(_) => {
                tracing::error!(error = %message, "interrupted stream reached the response boundary");
                (status, message).into_response()
            }
            _ => (status, message).into_response(),
        }
    }
}
