//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the single method-agnostic relay endpoint
//! - Wire up middleware (CORS preflight, tracing, limits, request ID,
//!   timeout)
//! - Hand each request to the relay pipeline
//! - Record per-request metrics
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{RelayConfig, RelayMode};
use crate::error::RelayError;
use crate::http::cors::cors_layer;
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::relay::RelayPipeline;

/// Application state injected into the relay handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RelayPipeline>,
    pub mode: RelayMode,
}

/// HTTP server for the edge relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let pipeline = Arc::new(RelayPipeline::new(&config)?);

        let state = AppState {
            pipeline,
            mode: config.relay.mode,
        };

        Ok(Self {
            router: Self::build_router(&config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// CORS sits outermost so preflight requests are answered without
    /// entering the pipeline.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.relay.max_body_bytes))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
            .layer(cors_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = signals::shutdown_signal() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main relay handler: runs the pipeline and records the outcome.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let request_id = request.request_id().unwrap_or("unknown").to_string();
    let method = request.method().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        "Relaying request"
    );

    let response = match state.pipeline.handle(request).await {
        Ok(response) => response,
        Err(e) => {
            if matches!(e, RelayError::Upstream(_)) {
                metrics::record_upstream_error();
            }
            tracing::warn!(request_id = %request_id, error = %e, "Relay request failed");
            e.into_response()
        }
    };

    metrics::record_request(
        &method,
        response.status().as_u16(),
        state.mode.as_str(),
        started,
    );
    response
}
