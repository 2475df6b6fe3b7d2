//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files, and
//! every section has a default so a minimal (or absent) config file works.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Relay pipeline behavior.
    pub relay: PipelineConfig,

    /// Access gate / challenge token settings.
    pub gate: GateConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// How the relay packages a fetched `text/html` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RelayMode {
    /// Relay the destination's bytes as-is.
    #[default]
    Proxy,
    /// Answer with a JSON envelope wrapping an iframe embed of the
    /// destination instead of its raw HTML.
    Embed,
}

impl RelayMode {
    /// Label used for metrics and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Proxy => "proxy",
            RelayMode::Embed => "embed",
        }
    }
}

/// How content classification treats the destination's file extension
/// versus the upstream `Content-Type` header when the two disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// Trust the upstream `Content-Type` header only.
    #[default]
    Header,
    /// Consult the `.css`/`.js` destination extension only when the
    /// upstream omits a content type.
    ExtensionFallback,
    /// The destination extension wins over a conflicting content type.
    ExtensionFirst,
}

/// Upstream redirect handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectMode {
    /// Follow redirects automatically, up to `max_redirects`.
    #[default]
    Follow,
    /// Surface redirect responses to the caller (after location rewriting).
    Manual,
}

/// Relay pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Response mode for HTML destinations.
    pub mode: RelayMode,

    /// Content-type classification policy.
    pub dispatch: DispatchMode,

    /// Upstream redirect policy.
    pub redirect: RedirectMode,

    /// Redirect hop cap when following automatically.
    pub max_redirects: usize,

    /// Public origin of this relay (e.g., "https://relay.example.com").
    /// When set, redirect locations are re-pointed through the relay.
    pub public_origin: Option<String>,

    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,

    /// Stream payload-method request bodies to the upstream instead of
    /// buffering them.
    pub stream_request_body: bool,

    /// Log the outbound request line and header set at debug level.
    pub request_debug: bool,

    /// Outbound header overrides, layered over the forwarded headers
    /// (override wins on conflict).
    pub request_headers: HashMap<String, String>,

    /// Response header blacklist override. When unset the built-in list
    /// of cookie, security-policy, and framing headers applies.
    pub blacklist: Option<Vec<String>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: RelayMode::Proxy,
            dispatch: DispatchMode::Header,
            redirect: RedirectMode::Follow,
            max_redirects: 10,
            public_origin: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            stream_request_body: false,
            request_debug: false,
            request_headers: HashMap::new(),
            blacklist: None,
        }
    }
}

/// Challenge verification backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GateMode {
    /// No gating; every request is allowed.
    #[default]
    Disabled,
    /// Challenge answers are compared against a locally configured secret.
    Local,
    /// Challenge answers are verified against a remote siteverify endpoint.
    Siteverify,
}

/// Access gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Verification backend.
    pub mode: GateMode,

    /// Shared secret for `local` mode, or the account secret sent to the
    /// siteverify endpoint in `siteverify` mode.
    pub challenge_secret: String,

    /// Verification endpoint for `siteverify` mode.
    pub siteverify_url: String,

    /// Lifetime of minted session tokens in seconds.
    pub token_ttl_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            mode: GateMode::Disabled,
            challenge_secret: String::new(),
            siteverify_url: String::new(),
            token_ttl_secs: 3600,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
