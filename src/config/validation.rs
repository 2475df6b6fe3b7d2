//! Configuration validation.
//!
//! Serde handles the syntactic layer; this module performs the semantic
//! checks that a config must pass before the relay accepts it. All failures
//! are collected and returned together, not just the first.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GateMode, RedirectMode, RelayConfig};

/// A single semantic configuration failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    BadBindAddress(String),

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    BadMetricsAddress(String),

    #[error("relay.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("relay.max_redirects must be greater than zero when redirect = \"follow\"")]
    ZeroRedirectCap,

    #[error("relay.public_origin {0:?} is not an absolute URL")]
    BadPublicOrigin(String),

    #[error("relay.blacklist entry {0:?} is not a valid header name")]
    BadBlacklistEntry(String),

    #[error("relay.request_headers key {0:?} is not a valid header name")]
    BadOverrideHeader(String),

    #[error("gate.challenge_secret is required when the gate is enabled")]
    MissingChallengeSecret,

    #[error("gate.siteverify_url is required in siteverify mode")]
    MissingSiteverifyUrl,

    #[error("gate.siteverify_url {0:?} is not an absolute URL")]
    BadSiteverifyUrl(String),

    #[error("gate.token_ttl_secs must be greater than zero when the gate is enabled")]
    ZeroTokenTtl,
}

/// Validate a configuration, returning every failure found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.relay.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.relay.redirect == RedirectMode::Follow && config.relay.max_redirects == 0 {
        errors.push(ValidationError::ZeroRedirectCap);
    }

    if let Some(origin) = &config.relay.public_origin {
        if Url::parse(origin).is_err() {
            errors.push(ValidationError::BadPublicOrigin(origin.clone()));
        }
    }

    if let Some(blacklist) = &config.relay.blacklist {
        for entry in blacklist {
            if HeaderName::try_from(entry.as_str()).is_err() {
                errors.push(ValidationError::BadBlacklistEntry(entry.clone()));
            }
        }
    }

    for key in config.relay.request_headers.keys() {
        if HeaderName::try_from(key.as_str()).is_err() {
            errors.push(ValidationError::BadOverrideHeader(key.clone()));
        }
    }

    if config.gate.mode != GateMode::Disabled {
        if config.gate.challenge_secret.is_empty() {
            errors.push(ValidationError::MissingChallengeSecret);
        }
        if config.gate.token_ttl_secs == 0 {
            errors.push(ValidationError::ZeroTokenTtl);
        }
    }
    if config.gate.mode == GateMode::Siteverify {
        if config.gate.siteverify_url.is_empty() {
            errors.push(ValidationError::MissingSiteverifyUrl);
        } else if Url::parse(&config.gate.siteverify_url).is_err() {
            errors.push(ValidationError::BadSiteverifyUrl(
                config.gate.siteverify_url.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
