//! Error types for the relay pipeline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Terminal failures of a single relay request.
///
/// Each variant maps to one taxonomy class: bad destination (client fault,
/// no I/O performed), gate denial (client fault), or upstream failure
/// (dependent-service fault). None of them is retried by the pipeline.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The `destination` query parameter was absent.
    #[error("Destination URL is required")]
    MissingDestination,

    /// The `destination` query parameter was present but not an absolute
    /// http(s) URL.
    #[error("Invalid destination URL: {0}")]
    InvalidDestination(String),

    /// The access gate denied the request.
    #[error("Invalid or missing token")]
    Denied,

    /// The upstream fetch failed (connect error, timeout, protocol error).
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Result type alias for pipeline operations.
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Status code surfaced to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingDestination | RelayError::InvalidDestination(_) => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Denied => StatusCode::UNAUTHORIZED,
            RelayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message surfaced to the original caller.
    ///
    /// Upstream failures collapse to a fixed string; the error chain is
    /// logged server-side and never leaks to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            RelayError::MissingDestination => "Destination URL is required",
            RelayError::InvalidDestination(_) => "Invalid destination URL",
            RelayError::Denied => "Invalid or missing token",
            RelayError::Upstream(_) => "Failed to proxy request",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}
