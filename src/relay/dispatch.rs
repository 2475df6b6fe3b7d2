//! Content-type dispatch for fetched responses.
//!
//! # Responsibilities
//! - Classify the upstream response (css / js / html / other)
//! - Force long-lived cache headers on css/js assets
//! - Produce the iframe embed envelope for HTML destinations in embed mode
//! - Stream everything else through without buffering
//!
//! # Design Decisions
//! - The upstream response is consumed exactly once per dispatch: buffered
//!   (css/js), streamed (passthrough), or released unread (embed)
//! - css/js may buffer fully since they are text; binary payloads stream
//!   to bound memory on large bodies
//! - Extension sniffing is governed by explicit configuration, never guessed

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde_json::json;
use url::Url;

use crate::config::{DispatchMode, RelayMode};
use crate::error::RelayResult;

/// Cache directive forced onto css/js assets, overriding upstream cache
/// headers: one year, immutable.
const ASSET_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Envelope message for embed-mode responses.
const EMBED_MESSAGE: &str = "Embedding content from the destination URL.";

/// Coarse content classification driving the dispatch branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Css,
    Js,
    Html,
    Other,
}

/// Packages fetched upstream responses for the original caller.
#[derive(Debug, Clone, Copy)]
pub struct ContentDispatcher {
    mode: RelayMode,
    dispatch: DispatchMode,
}

impl ContentDispatcher {
    pub fn new(mode: RelayMode, dispatch: DispatchMode) -> Self {
        Self { mode, dispatch }
    }

    /// Consume the upstream response and assemble the outgoing one.
    ///
    /// `sanitized` is the already-blacklist-filtered upstream header set;
    /// the css/js branches additionally force their content type and cache
    /// directive on top of it.
    pub async fn dispatch(
        self,
        upstream: reqwest::Response,
        destination: &Url,
        sanitized: HeaderMap,
    ) -> RelayResult<Response> {
        let status = upstream.status();
        let content_type = upstream
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let class = classify(content_type.as_deref(), destination, self.dispatch);
        tracing::debug!(
            destination = %destination,
            content_type = content_type.as_deref().unwrap_or("-"),
            class = ?class,
            "Dispatching upstream response"
        );

        match class {
            ContentClass::Css => {
                let body = upstream.bytes().await?;
                Ok(asset_response(status, sanitized, "text/css", body))
            }
            ContentClass::Js => {
                let body = upstream.bytes().await?;
                Ok(asset_response(
                    status,
                    sanitized,
                    "application/javascript",
                    body,
                ))
            }
            ContentClass::Html if self.mode == RelayMode::Embed => {
                // The wrapper replaces the page; the upstream body is
                // released unread when `upstream` drops here.
                drop(upstream);
                Ok(embed_response(destination))
            }
            ContentClass::Html | ContentClass::Other => {
                // Mid-transfer stream errors terminate the response; the
                // connection closes with it, so nothing hangs.
                let stream = upstream
                    .bytes_stream()
                    .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream error"));
                let mut response = Response::new(Body::from_stream(stream));
                *response.status_mut() = status;
                *response.headers_mut() = sanitized;
                Ok(response)
            }
        }
    }
}

fn asset_response(
    status: StatusCode,
    sanitized: HeaderMap,
    content_type: &'static str,
    body: axum::body::Bytes,
) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = sanitized;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(ASSET_CACHE_CONTROL));
    response
}

fn embed_response(destination: &Url) -> Response {
    Json(json!({
        "message": EMBED_MESSAGE,
        "html": embed_document(destination.as_str()),
    }))
    .into_response()
}

/// Minimal wrapper document: a full-viewport, borderless iframe whose `src`
/// is the exact destination URL.
pub fn embed_document(destination: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Embedded Content</title>
  <style>
    body {{ margin: 0; padding: 0; }}
    iframe {{ width: 100%; height: 100vh; border: none; }}
  </style>
</head>
<body>
  <iframe src="{destination}" frameborder="0"></iframe>
</body>
</html>
"#
    )
}

/// Decide the dispatch branch from the declared content type and, when the
/// configured mode asks for it, the destination's file extension.
pub fn classify(
    content_type: Option<&str>,
    destination: &Url,
    mode: DispatchMode,
) -> ContentClass {
    let from_header = content_type.map(header_class);
    let from_extension = extension_class(destination);

    match mode {
        DispatchMode::Header => from_header.unwrap_or(ContentClass::Other),
        DispatchMode::ExtensionFallback => from_header
            .or(from_extension)
            .unwrap_or(ContentClass::Other),
        DispatchMode::ExtensionFirst => from_extension
            .or(from_header)
            .unwrap_or(ContentClass::Other),
    }
}

fn header_class(content_type: &str) -> ContentClass {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "text/css" => ContentClass::Css,
        "application/javascript" | "text/javascript" => ContentClass::Js,
        "text/html" => ContentClass::Html,
        _ => ContentClass::Other,
    }
}

fn extension_class(destination: &Url) -> Option<ContentClass> {
    let path = destination.path();
    if path.ends_with(".css") {
        Some(ContentClass::Css)
    } else if path.ends_with(".js") {
        Some(ContentClass::Js)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn header_mode_trusts_content_type() {
        let d = dest("https://example.com/app.js");
        assert_eq!(
            classify(Some("text/css"), &d, DispatchMode::Header),
            ContentClass::Css
        );
        assert_eq!(classify(None, &d, DispatchMode::Header), ContentClass::Other);
    }

    #[test]
    fn header_class_ignores_parameters_and_case() {
        let d = dest("https://example.com/");
        assert_eq!(
            classify(Some("Text/HTML; charset=utf-8"), &d, DispatchMode::Header),
            ContentClass::Html
        );
        assert_eq!(
            classify(Some("text/javascript"), &d, DispatchMode::Header),
            ContentClass::Js
        );
    }

    #[test]
    fn extension_fallback_fills_missing_header() {
        let d = dest("https://example.com/styles.css");
        assert_eq!(
            classify(None, &d, DispatchMode::ExtensionFallback),
            ContentClass::Css
        );
        // A declared content type still wins over the extension.
        assert_eq!(
            classify(Some("text/html"), &d, DispatchMode::ExtensionFallback),
            ContentClass::Html
        );
    }

    #[test]
    fn extension_first_overrides_conflicting_header() {
        let d = dest("https://example.com/bundle.js");
        assert_eq!(
            classify(Some("text/plain"), &d, DispatchMode::ExtensionFirst),
            ContentClass::Js
        );
        // Without a recognized extension the header still decides.
        let plain = dest("https://example.com/page");
        assert_eq!(
            classify(Some("text/html"), &plain, DispatchMode::ExtensionFirst),
            ContentClass::Html
        );
    }

    #[test]
    fn embed_document_embeds_exact_destination() {
        let html = embed_document("https://example.com/page.html");
        assert!(html.contains(r#"<iframe src="https://example.com/page.html" frameborder="0">"#));
        assert!(html.contains("height: 100vh"));
        assert!(html.contains("border: none"));
    }
}
