//! The relay pipeline.
//!
//! # Data Flow
//! ```text
//! incoming request
//!     → parse destination   (no I/O before this succeeds)
//!     → gate check          (deny before any upstream I/O)
//!     → build request       (bounded body buffer or half-duplex stream,
//!                            header policy merge)
//!     → fetch               (single upstream request, never retried)
//!     → dispatch            (content-type branch)
//!     → respond             (issued token attached after all other headers)
//! ```
//!
//! # Design Decisions
//! - Strictly linear per request; each failed stage is terminal
//! - The pipeline future owns the upstream transfer, so a caller
//!   disconnect drops the future and aborts the fetch with it
//! - No cross-request state lives here; the gate's verifier owns the only
//!   shared store

use std::collections::HashSet;

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, Request, Uri};
use axum::response::Response;
use url::Url;

use crate::config::{RedirectMode, RelayConfig};
use crate::error::{RelayError, RelayResult};
use crate::relay::dispatch::ContentDispatcher;
use crate::relay::headers::{blacklist_set, build_inbound_headers, build_outbound_headers, proxy_request_headers};
use crate::security::{attach_token_header, AccessGate};

/// Methods whose request body is forwarded to the destination.
const PAYLOAD_METHODS: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// Orchestrates one relay request from destination parsing to response
/// assembly. Constructed once and shared across requests; holds no
/// per-request state.
pub struct RelayPipeline {
    client: reqwest::Client,
    gate: AccessGate,
    dispatcher: ContentDispatcher,
    overrides: HeaderMap,
    blacklist: HashSet<String>,
    public_origin: Option<Url>,
    max_body_bytes: usize,
    stream_request_body: bool,
    request_debug: bool,
}

impl RelayPipeline {
    /// Build the pipeline from validated configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let redirect = match config.relay.redirect {
            RedirectMode::Follow => reqwest::redirect::Policy::limited(config.relay.max_redirects),
            RedirectMode::Manual => reqwest::redirect::Policy::none(),
        };
        let client = reqwest::Client::builder()
            .redirect(redirect)
            .connect_timeout(std::time::Duration::from_secs(config.timeouts.connect_secs))
            .build()?;

        let mut overrides = HeaderMap::new();
        for (name, value) in &config.relay.request_headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    overrides.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping malformed header override"),
            }
        }

        // public_origin is validated at config load; a parse failure here
        // only disables location rewriting.
        let public_origin = config
            .relay
            .public_origin
            .as_deref()
            .and_then(|origin| Url::parse(origin).ok());

        Ok(Self {
            client,
            gate: AccessGate::from_config(&config.gate),
            dispatcher: ContentDispatcher::new(config.relay.mode, config.relay.dispatch),
            overrides,
            blacklist: blacklist_set(config.relay.blacklist.as_deref()),
            public_origin,
            max_body_bytes: config.relay.max_body_bytes,
            stream_request_body: config.relay.stream_request_body,
            request_debug: config.relay.request_debug,
        })
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, request: Request<Body>) -> RelayResult<Response> {
        let destination = parse_destination(request.uri())?;

        let decision = self.gate.check_access(request.headers()).await;
        if !decision.allowed {
            return Err(RelayError::Denied);
        }

        let (parts, body) = request.into_parts();
        let forwarded = proxy_request_headers(&parts.headers);
        let outbound = build_outbound_headers(&forwarded, &self.overrides);

        let mut builder = self
            .client
            .request(parts.method.clone(), destination.clone())
            .headers(outbound.clone());

        if PAYLOAD_METHODS.contains(&parts.method) {
            if self.stream_request_body {
                builder = builder.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            } else {
                match axum::body::to_bytes(body, self.max_body_bytes).await {
                    Ok(bytes) if !bytes.is_empty() => builder = builder.body(bytes),
                    Ok(_) => {}
                    Err(e) => {
                        // A failed body read degrades to an empty body; the
                        // request itself still goes out.
                        tracing::warn!(error = %e, "Failed to read request body");
                    }
                }
            }
        }

        if self.request_debug {
            tracing::debug!(
                method = %parts.method,
                destination = %destination,
                headers = ?outbound,
                "Outbound request"
            );
        }

        let upstream = builder.send().await?;

        tracing::debug!(
            destination = %destination,
            status = %upstream.status(),
            "Upstream responded"
        );

        let sanitized = build_inbound_headers(
            upstream.headers(),
            &destination,
            &self.blacklist,
            self.public_origin.as_ref(),
        );
        let mut response = self
            .dispatcher
            .dispatch(upstream, &destination, sanitized)
            .await?;

        if let Some(token) = decision.issued_token.as_deref() {
            attach_token_header(&mut response, token);
        }

        Ok(response)
    }
}

/// Extract and validate the `destination` query parameter. Runs before any
/// network access; failures terminate the request as a client error.
fn parse_destination(uri: &Uri) -> RelayResult<Url> {
    let raw = uri
        .query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "destination")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(RelayError::MissingDestination)?;

    let destination =
        Url::parse(&raw).map_err(|_| RelayError::InvalidDestination(raw.clone()))?;
    match destination.scheme() {
        "http" | "https" => Ok(destination),
        _ => Err(RelayError::InvalidDestination(raw)),
    }
}
