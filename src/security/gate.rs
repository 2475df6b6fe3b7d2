//! Access gate for the relay pipeline.
//!
//! Decides whether a request may proceed and whether a fresh session token
//! must be minted, strictly before any upstream I/O. Proof of access is
//! either a previously minted session token (`x-token`) or a challenge
//! answer (`x-challenge-response`) checked by the verifier backend.

use std::time::Duration;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;

use crate::config::{GateConfig, GateMode};
use crate::relay::headers::{X_CHALLENGE_RESPONSE, X_TOKEN};
use crate::security::verifier::{TokenStore, Verifier};

/// Outcome of the gate check, produced once per request and consumed
/// immediately; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub issued_token: Option<String>,
}

impl AccessDecision {
    fn denied() -> Self {
        Self {
            allowed: false,
            issued_token: None,
        }
    }

    fn allowed_without_mint() -> Self {
        Self {
            allowed: true,
            issued_token: None,
        }
    }
}

/// Wraps the external challenge verifier and its token store.
pub struct AccessGate {
    mode: GateMode,
    verifier: Verifier,
    store: TokenStore,
}

impl AccessGate {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            mode: config.mode,
            verifier: Verifier::from_config(config),
            store: TokenStore::new(Duration::from_secs(config.token_ttl_secs)),
        }
    }

    /// Decide whether the request may proceed.
    ///
    /// A valid session token allows the request without minting a new one;
    /// a valid challenge answer allows it and mints. Token issuance is
    /// therefore idempotent across a caller's session.
    pub async fn check_access(&self, headers: &HeaderMap) -> AccessDecision {
        if self.mode == GateMode::Disabled {
            return AccessDecision::allowed_without_mint();
        }

        if let Some(token) = header_str(headers, X_TOKEN) {
            if self.store.accept(token) {
                return AccessDecision::allowed_without_mint();
            }
        }

        if let Some(answer) = header_str(headers, X_CHALLENGE_RESPONSE) {
            if self.verifier.challenge_valid(answer).await {
                return AccessDecision {
                    allowed: true,
                    issued_token: Some(self.store.mint()),
                };
            }
        }

        crate::observability::metrics::record_gate_denied();
        AccessDecision::denied()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Attach a freshly issued token to the outgoing response.
///
/// Called after every other header-setting step so the token cannot be
/// overwritten by header-merge logic; `insert` keeps it single-valued.
pub fn attach_token_header(response: &mut Response, token: &str) {
    if let Ok(value) = HeaderValue::from_str(token) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(X_TOKEN), value);
    }
}
