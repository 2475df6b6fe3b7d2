//! Header policy for the relay.
//!
//! # Responsibilities
//! - Normalize forwarded request headers at the transport boundary
//! - Merge configured overrides over forwarded headers (override wins)
//! - Strip content encodings the relay cannot safely re-emit
//! - Sanitize upstream response headers against the blacklist
//! - Rewrite redirect locations to stay consistent with the relay origin
//!
//! # Design Decisions
//! - `HeaderMap` is the single ordered, case-insensitive multimap used for
//!   all header sets; conversion happens exactly once per boundary
//! - Merge semantics are total: union of keys, later-applied source wins
//! - Multi-valued upstream headers keep all values unless blacklisted

use std::collections::HashSet;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

/// Header carrying a session token (request proof and response issuance).
pub const X_TOKEN: &str = "x-token";

/// Header carrying a challenge answer for first-time callers.
pub const X_CHALLENGE_RESPONSE: &str = "x-challenge-response";

/// Hop-by-hop headers that never cross the relay in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Response headers stripped regardless of upstream: cookie-setting,
/// security-policy, and framing-control names that would leak
/// upstream-scoped state or block embedding.
pub const DEFAULT_BLACKLIST: [&str; 12] = [
    "set-cookie",
    "set-cookie2",
    "content-security-policy",
    "content-security-policy-report-only",
    "x-content-security-policy",
    "x-webkit-csp",
    "x-frame-options",
    "strict-transport-security",
    "expect-ct",
    "cross-origin-opener-policy",
    "cross-origin-embedder-policy",
    "clear-site-data",
];

/// Build the effective response blacklist as a lowercase name set.
pub fn blacklist_set(overrides: Option<&[String]>) -> HashSet<String> {
    match overrides {
        Some(names) => names.iter().map(|n| n.to_ascii_lowercase()).collect(),
        None => DEFAULT_BLACKLIST.iter().map(|n| n.to_string()).collect(),
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Boundary conversion for the incoming request: forwarded headers minus
/// hop-by-hop names, `host` (the upstream client sets its own), and
/// `content-length` (recomputed for the outbound body).
pub fn proxy_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in incoming.iter() {
        if is_hop_by_hop(name)
            || name == axum::http::header::HOST
            || name == axum::http::header::CONTENT_LENGTH
        {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Compute the outbound request header set: forwarded headers with the
/// configured overrides layered on top key-by-key, then the
/// `Accept-Encoding` normalization applied.
///
/// An override replaces every forwarded value under its key; keys absent
/// from the overrides clear nothing.
pub fn build_outbound_headers(forwarded: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = forwarded.clone();
    for (name, value) in overrides.iter() {
        merged.insert(name.clone(), value.clone());
    }
    normalize_accept_encoding(&mut merged);
    merged
}

/// Remove the `zstd` token from `Accept-Encoding`, preserving the order of
/// the remaining tokens. The relay forwards bodies verbatim and cannot
/// safely re-emit zstd-coded content to every caller.
fn normalize_accept_encoding(headers: &mut HeaderMap) {
    let Some(value) = headers.get(axum::http::header::ACCEPT_ENCODING) else {
        return;
    };
    let Ok(value) = value.to_str() else {
        return;
    };
    if !value.contains("zstd") {
        return;
    }
    let filtered = value
        .split(',')
        .map(str::trim)
        .filter(|token| *token != "zstd")
        .collect::<Vec<_>>()
        .join(", ");
    match HeaderValue::from_str(&filtered) {
        Ok(v) => {
            headers.insert(axum::http::header::ACCEPT_ENCODING, v);
        }
        Err(_) => {
            headers.remove(axum::http::header::ACCEPT_ENCODING);
        }
    }
}

/// Sanitize upstream response headers for the outgoing response.
///
/// Copies every upstream header (keeping multi-values), dropping hop-by-hop
/// names, framing headers the server layer recomputes (`content-length`,
/// `transfer-encoding` via the hop-by-hop list), and every blacklisted name.
/// A `location` header is rewritten against the destination.
pub fn build_inbound_headers(
    upstream: &HeaderMap,
    destination: &Url,
    blacklist: &HashSet<String>,
    public_origin: Option<&Url>,
) -> HeaderMap {
    let mut sanitized = HeaderMap::new();
    for (name, value) in upstream.iter() {
        if is_hop_by_hop(name)
            || name == axum::http::header::CONTENT_LENGTH
            || blacklist.contains(name.as_str())
        {
            continue;
        }
        if name == axum::http::header::LOCATION {
            if let Some(rewritten) = rewrite_location(value, destination, public_origin) {
                sanitized.insert(axum::http::header::LOCATION, rewritten);
            }
            continue;
        }
        sanitized.append(name.clone(), value.clone());
    }
    sanitized
}

/// Resolve a redirect target against the destination and, when the relay
/// has a public origin, re-point it through the relay so the caller's next
/// hop stays on this service.
fn rewrite_location(
    value: &HeaderValue,
    destination: &Url,
    public_origin: Option<&Url>,
) -> Option<HeaderValue> {
    let raw = value.to_str().ok()?;
    let absolute = destination.join(raw).ok()?;
    let rewritten = match public_origin {
        Some(origin) => {
            let encoded: String =
                url::form_urlencoded::byte_serialize(absolute.as_str().as_bytes()).collect();
            format!("{}?destination={}", origin.as_str().trim_end_matches('/'), encoded)
        }
        None => absolute.into(),
    };
    HeaderValue::from_str(&rewritten).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn strips_hop_by_hop_and_host() {
        let incoming = headers(&[
            ("host", "relay.local"),
            ("connection", "keep-alive"),
            ("content-length", "42"),
            ("accept", "text/html"),
        ]);
        let forwarded = proxy_request_headers(&incoming);
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn override_wins_on_conflict() {
        let forwarded = headers(&[("user-agent", "caller/1.0"), ("accept", "*/*")]);
        let overrides = headers(&[("user-agent", "edge-relay/0.1")]);
        let merged = build_outbound_headers(&forwarded, &overrides);
        assert_eq!(merged.get("user-agent").unwrap(), "edge-relay/0.1");
        assert_eq!(merged.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn absent_override_clears_nothing() {
        let forwarded = headers(&[("accept", "*/*")]);
        let merged = build_outbound_headers(&forwarded, &HeaderMap::new());
        assert_eq!(merged.get("accept").unwrap(), "*/*");
    }

    #[test]
    fn zstd_removed_preserving_remaining_tokens() {
        let forwarded = headers(&[("accept-encoding", "gzip, zstd, br")]);
        let merged = build_outbound_headers(&forwarded, &HeaderMap::new());
        assert_eq!(merged.get("accept-encoding").unwrap(), "gzip, br");
    }

    #[test]
    fn accept_encoding_without_zstd_untouched() {
        let forwarded = headers(&[("accept-encoding", "gzip,br")]);
        let merged = build_outbound_headers(&forwarded, &HeaderMap::new());
        assert_eq!(merged.get("accept-encoding").unwrap(), "gzip,br");
    }

    #[test]
    fn blacklist_strips_case_insensitively() {
        let upstream = headers(&[
            ("Set-Cookie", "sid=1"),
            ("X-Frame-Options", "DENY"),
            ("content-type", "text/html"),
        ]);
        let destination = Url::parse("https://example.com/").unwrap();
        let sanitized = build_inbound_headers(
            &upstream,
            &destination,
            &blacklist_set(None),
            None,
        );
        assert!(sanitized.get("set-cookie").is_none());
        assert!(sanitized.get("x-frame-options").is_none());
        assert_eq!(sanitized.get("content-type").unwrap(), "text/html");
    }

    #[test]
    fn multi_valued_headers_survive() {
        let mut upstream = HeaderMap::new();
        upstream.append("vary", HeaderValue::from_static("accept"));
        upstream.append("vary", HeaderValue::from_static("origin"));
        let destination = Url::parse("https://example.com/").unwrap();
        let sanitized = build_inbound_headers(
            &upstream,
            &destination,
            &blacklist_set(None),
            None,
        );
        assert_eq!(sanitized.get_all("vary").iter().count(), 2);
    }

    #[test]
    fn relative_location_resolved_against_destination() {
        let upstream = headers(&[("location", "/next/page")]);
        let destination = Url::parse("https://example.com/start").unwrap();
        let sanitized = build_inbound_headers(
            &upstream,
            &destination,
            &blacklist_set(None),
            None,
        );
        assert_eq!(
            sanitized.get("location").unwrap(),
            "https://example.com/next/page"
        );
    }

    #[test]
    fn location_repointed_through_relay_origin() {
        let upstream = headers(&[("location", "https://example.com/next")]);
        let destination = Url::parse("https://example.com/start").unwrap();
        let origin = Url::parse("https://relay.example.net").unwrap();
        let sanitized = build_inbound_headers(
            &upstream,
            &destination,
            &blacklist_set(None),
            Some(&origin),
        );
        assert_eq!(
            sanitized.get("location").unwrap(),
            "https://relay.example.net?destination=https%3A%2F%2Fexample.com%2Fnext"
        );
    }

    #[test]
    fn blacklist_override_replaces_default() {
        let upstream = headers(&[("set-cookie", "sid=1"), ("x-powered-by", "php")]);
        let destination = Url::parse("https://example.com/").unwrap();
        let overrides = vec!["X-Powered-By".to_string()];
        let sanitized = build_inbound_headers(
            &upstream,
            &destination,
            &blacklist_set(Some(&overrides)),
            None,
        );
        // Overridden list governs: set-cookie survives, x-powered-by does not.
        assert!(sanitized.get("set-cookie").is_some());
        assert!(sanitized.get("x-powered-by").is_none());
    }
}
