//! Cross-origin collaborator.
//!
//! Answers preflight OPTIONS requests before they reach the relay pipeline
//! and appends the allow/expose headers to pipeline responses. The issued
//! session token header is exposed so browser callers can read it.

use axum::http::header::HeaderName;
use tower_http::cors::{Any, CorsLayer};

use crate::relay::headers::X_TOKEN;

/// Build the CORS layer for the relay endpoint.
///
/// The relay is an open intermediary: any origin, method, and request
/// header is accepted. Access policy is the gate's job, not CORS's.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(X_TOKEN)])
}
