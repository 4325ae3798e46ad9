//! Server assembly: router construction, WebSocket upgrade, and lifecycle.
//!
//! [`PitchlineServer::start`] opens (and migrates) the database, wires up
//! [`AppState`], binds the listener, and serves until shutdown. The `/ws`
//! route runs the connection authenticator during the upgrade and hands the
//! resolved scope to the session loop; the upgrade itself is never refused
//! for a bad credential — only for capacity.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::handlers;
use crate::health::{health_check, HealthResponse};
use crate::state::AppState;
use crate::websocket::{authenticator, session};
use pitchline_store::{new_file, new_in_memory, run_migrations, StoreError};

/// Errors while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// Binding the listener failed.
    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),

    /// Opening or migrating the database failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A running Pitchline server.
///
/// Dropping the handle does not stop the server; call
/// [`PitchlineServer::shutdown`] for a graceful stop.
pub struct PitchlineServer {
    addr: SocketAddr,
    state: AppState,
    serve_task: JoinHandle<()>,
}

impl PitchlineServer {
    /// Open the database, run migrations, and serve on the configured
    /// address. A configured port of `0` binds an ephemeral port; read the
    /// actual one from [`Self::addr`].
    pub async fn start(config: &AppConfig) -> Result<Self, StartError> {
        let pool = match &config.database.path {
            Some(path) => new_file(path, &config.database.pool)?,
            None => new_in_memory(&config.database.pool)?,
        };
        {
            let conn = pool.get().map_err(StoreError::from)?;
            let applied = run_migrations(&conn)?;
            info!(applied, "database ready");
        }

        let state = AppState::new(pool, &config.auth, config.server.clone());
        let listener =
            TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
        let addr = listener.local_addr()?;

        let router = build_router(state.clone());
        let shutdown = state.shutdown.token();
        let serve_task = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned());
            if let Err(e) = serve.await {
                error!(error = %e, "server task exited with error");
            }
        });

        info!(%addr, "pitchline server started");
        Ok(Self {
            addr,
            state,
            serve_task,
        })
    }

    /// The address the server is listening on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Shared application state (tests seed the store through this).
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Signal shutdown and wait for the serve task to drain.
    pub async fn shutdown(self) {
        self.state.shutdown.shutdown();
        if let Err(e) = self.serve_task.await {
            error!(error = %e, "serve task join failed during shutdown");
        }
        info!("pitchline server stopped");
    }
}

/// Build the Axum router with all routes.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/api/auth/organization",
            post(handlers::auth::select_organization),
        )
        .route(
            "/api/organizations/{id}/subscriptions",
            post(handlers::subscriptions::subscribe).delete(handlers::subscriptions::unsubscribe),
        )
        .route(
            "/api/organizations/{id}/content",
            put(handlers::content::update_content),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// WebSocket upgrade handler.
///
/// The authenticator resolves the scope from the handshake headers before
/// the upgrade completes; a missing or invalid credential still upgrades,
/// as anonymous. Only the connection cap refuses the upgrade.
async fn ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if state.broadcast.connection_count().await >= state.config.max_connections {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let scope = authenticator::authenticate(&headers, &state.tokens, &state.pool).await;
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| session::run(socket, scope, state))
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.broadcast.connection_count().await;
    Json(health_check(state.start_time, connections))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
