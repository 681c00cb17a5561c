//! HTTP surface: the WebSocket route, CORS and the listener.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::{Method, header};
use axum::response::Response;
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{Instrument as _, info, info_span, warn};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::session::run_session;

/// Path clients connect to.
pub const WS_PATH: &str = "/";

/// Build the application router.
#[must_use]
pub fn router(config: Arc<ServerConfig>) -> Router {
    Router::new()
        .route(WS_PATH, get(upgrade))
        .layer(cors())
        .with_state(config)
}

/// CORS policy: mirror whatever origin asks.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            header::USER_AGENT,
            header::CONNECTION,
        ])
}

async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(config): State<Arc<ServerConfig>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, config))
}

async fn handle_socket(mut socket: WebSocket, peer: SocketAddr, config: Arc<ServerConfig>) {
    let span = info_span!("session", %peer);
    async move {
        info!(variant = config.variant.name(), "connection opened");
        let reason = run_session(&mut socket, &config).await;
        info!(clean = reason.is_clean(), "connection closed");
    }
    .instrument(span)
    .await;
}

/// Bind `config.listen` and serve until Ctrl-C.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be bound and
/// [`ServerError::Serve`] if the accept loop fails.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let addr = config.listen;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let local = listener.local_addr().map_err(ServerError::Serve)?;
    info!(
        addr = %local,
        variant = config.variant.name(),
        frame_timeout_ms = config.frame_timeout.as_millis(),
        "listening"
    );

    let app = router(Arc::new(config));
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
