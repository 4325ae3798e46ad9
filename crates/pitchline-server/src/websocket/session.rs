//! Per-socket lifecycle: register, pump frames, heartbeat, clean up.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use pitchline_core::ids::ConnectionId;
use pitchline_core::ConnectionScope;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::connection::ClientConnection;
use super::handler::handle_frame;
use super::heartbeat::{run_heartbeat, HeartbeatResult};
use crate::state::AppState;

/// Drive one WebSocket connection until it closes, times out, or the server
/// shuts down.
///
/// The scope was resolved during the handshake and is fixed for the life of
/// the connection. On any exit path the connection is deregistered so no
/// scope state survives the socket.
pub async fn run(socket: WebSocket, scope: ConnectionScope, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<String>(state.config.send_queue_depth);
    let conn = Arc::new(ClientConnection::new(ConnectionId::new(), scope, tx));
    state.broadcast.add(conn.clone()).await;
    info!(
        conn_id = %conn.id,
        authenticated = conn.scope.is_authenticated(),
        "WebSocket client connected"
    );

    let (mut ws_tx, mut ws_rx) = socket.split();
    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);

    // Writer: forward queued frames and send periodic pings.
    let writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        ping.tick().await; // consume the immediate first tick
        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let cancel = CancellationToken::new();
    let mut heartbeat = tokio::spawn(run_heartbeat(
        conn.clone(),
        ping_interval,
        Duration::from_secs(state.config.heartbeat_timeout_secs),
        cancel.clone(),
    ));

    let shutdown = state.shutdown.token();
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_frame(text.as_str(), &conn.scope, &state).await;
                        let _ = conn.send(response.to_json());
                    }
                    Some(Ok(Message::Pong(_) | Message::Ping(_))) => conn.mark_alive(),
                    Some(Ok(Message::Binary(_))) => {
                        debug!(conn_id = %conn.id, "ignoring binary frame");
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                }
            }
            outcome = &mut heartbeat => {
                if matches!(outcome, Ok(HeartbeatResult::TimedOut)) {
                    info!(conn_id = %conn.id, "heartbeat timed out, closing connection");
                }
                break;
            }
            () = shutdown.cancelled() => {
                debug!(conn_id = %conn.id, "server shutting down, closing connection");
                break;
            }
        }
    }

    cancel.cancel();
    heartbeat.abort();
    writer.abort();
    state.broadcast.remove(&conn.id).await;
    info!(
        conn_id = %conn.id,
        dropped = conn.drop_count(),
        "WebSocket client disconnected"
    );
}
