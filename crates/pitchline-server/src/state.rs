//! Shared application state and blocking-store dispatch.

use std::sync::Arc;
use std::time::Instant;

use pitchline_auth::{AuthConfig, TokenService};
use pitchline_notify::Dispatcher;
use pitchline_store::{ConnectionPool, StoreError};

use crate::config::ServerConfig;
use crate::delivery::WebSocketDelivery;
use crate::directory::{StoreMemberDirectory, StoreSubscriberDirectory};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcast::BroadcastManager;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ConnectionPool,
    /// Token service (issue / verify / augment / rotate).
    pub tokens: Arc<TokenService>,
    /// Broadcast manager for live connections.
    pub broadcast: Arc<BroadcastManager>,
    /// Notification dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Listener and connection settings.
    pub config: ServerConfig,
    /// When the server started.
    pub start_time: Instant,
}

impl AppState {
    /// Wire up the full state graph over a connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool, auth: &AuthConfig, config: ServerConfig) -> Self {
        let broadcast = Arc::new(BroadcastManager::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(StoreMemberDirectory::new(pool.clone())),
            Arc::new(StoreSubscriberDirectory::new(pool.clone())),
            Arc::new(WebSocketDelivery::new(broadcast.clone())),
        ));
        Self {
            pool,
            tokens: Arc::new(TokenService::new(auth)),
            broadcast,
            dispatcher,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            config,
            start_time: Instant::now(),
        }
    }
}

/// Run a store closure on the blocking thread pool.
///
/// `SQLite` calls are synchronous; dispatching them through
/// [`tokio::task::spawn_blocking`] keeps the event loop free while a
/// connection is checked out and queried.
pub async fn with_store<T, F>(pool: ConnectionPool, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Connection) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await
    .map_err(|e| StoreError::Internal(format!("blocking task failed: {e}")))?
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
