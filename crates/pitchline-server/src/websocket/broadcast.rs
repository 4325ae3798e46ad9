//! Fan-out to connected WebSocket clients.
//!
//! Connections are indexed by connection ID; identity-addressed sends scan
//! for every live connection bound to that identity, since one identity may
//! hold several connections (multiple tabs, devices).

use std::collections::HashMap;
use std::sync::Arc;

use pitchline_core::ids::{ConnectionId, IdentityId};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;

/// Manages the set of live connections and event fan-out.
pub struct BroadcastManager {
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
}

impl BroadcastManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
    }

    /// Remove a connection by ID.
    pub async fn remove(&self, connection_id: &ConnectionId) {
        let mut conns = self.connections.write().await;
        let _ = conns.remove(connection_id);
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a pre-serialized frame to every connection bound to an identity.
    ///
    /// Returns the number of connections the frame was queued to. Zero means
    /// the identity has no live connection — not an error, delivery here is
    /// best-effort.
    pub async fn send_to_identity(&self, identity_id: IdentityId, frame: &str) -> usize {
        let conns = self.connections.read().await;
        let mut reached = 0;
        for conn in conns.values() {
            if conn.identity_id() != Some(identity_id) {
                continue;
            }
            if conn.send(frame.to_string()) {
                reached += 1;
            } else {
                warn!(conn_id = %conn.id, %identity_id, "failed to queue frame to client");
            }
        }
        debug!(%identity_id, reached, "identity-addressed send");
        reached
    }

    /// Connections bound to a specific identity.
    pub async fn identity_connections(&self, identity_id: IdentityId) -> Vec<Arc<ClientConnection>> {
        let conns = self.connections.read().await;
        conns
            .values()
            .filter(|c| c.identity_id() == Some(identity_id))
            .cloned()
            .collect()
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
