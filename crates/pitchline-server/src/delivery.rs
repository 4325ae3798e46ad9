//! WebSocket delivery channel for notifications.
//!
//! Pushes composed notifications to the recipient's live connections. A
//! recipient with no open connection is simply unreachable on this channel;
//! that is not a delivery failure — the dispatcher's contract is compose and
//! submit, not confirm.

use std::sync::Arc;

use async_trait::async_trait;
use pitchline_core::ids::IdentityId;
use pitchline_notify::{DeliveryChannel, DispatchError, Notification};
use serde_json::json;
use tracing::debug;

use crate::websocket::broadcast::BroadcastManager;

/// Delivers notifications as `{"type": "notification", ...}` frames over
/// open WebSocket connections.
pub struct WebSocketDelivery {
    broadcast: Arc<BroadcastManager>,
}

impl WebSocketDelivery {
    /// Create a delivery channel over the broadcast manager.
    #[must_use]
    pub fn new(broadcast: Arc<BroadcastManager>) -> Self {
        Self { broadcast }
    }
}

#[async_trait]
impl DeliveryChannel for WebSocketDelivery {
    async fn submit(
        &self,
        recipient: IdentityId,
        notification: &Notification,
    ) -> Result<(), DispatchError> {
        let frame = json!({ "type": "notification", "notification": notification });
        let frame = serde_json::to_string(&frame).map_err(|e| DispatchError::Delivery {
            reason: e.to_string(),
        })?;
        let reached = self.broadcast.send_to_identity(recipient, &frame).await;
        debug!(%recipient, reached, id = %notification.id, "notification submitted");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
