//! HTTP server setup and the file handler.
//!
//! # Responsibilities
//! - Create the Axum router; every path serves the configured file
//! - Wire up middleware (request ID, tracing, timeout)
//! - Open the source before committing a status
//! - Pipe the source into the response body
//! - Shut down gracefully on signal

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::stream_response;
use crate::lifecycle::shutdown_signal;
use crate::observability::metrics;
use crate::relay::{pipe, FileSource, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub source_path: Arc<PathBuf>,
    pub chunk_size: usize,
    pub channel_capacity: usize,
}

/// HTTP server for the file relay.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState {
            source_path: Arc::new(config.source.path.clone()),
            chunk_size: config.relay.chunk_size,
            channel_capacity: config.relay.channel_capacity,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request.headers().request_id(),
                    )
                }),
            )
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        Router::new()
            .route("/", any(serve_file))
            .route("/{*path}", any(serve_file))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server until `shutdown` fires or Ctrl+C is received.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            source = %self.config.source.path.display(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Stream the configured file to the client.
///
/// The file is opened before any status is chosen, so a missing file still
/// gets a clean 500. After that the relay owns the body; a later failure
/// can only cut the response short.
async fn serve_file(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, RelayError> {
    let request_id = headers.request_id();

    let source = match FileSource::open(state.source_path.as_path(), state.chunk_size).await {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(request_id = %request_id, peer = %peer, error = %e, "Source unavailable");
            metrics::record_response(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            return Err(e);
        }
    };

    let len = source.len();
    tracing::debug!(
        request_id = %request_id,
        peer = %peer,
        path = %source.path().display(),
        bytes = len,
        "Streaming source"
    );

    let (body, _session) = pipe(source, state.channel_capacity);
    metrics::record_response(StatusCode::OK.as_u16());
    Ok(stream_response(body, len))
}
