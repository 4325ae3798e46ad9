//! Chat protocol dispatch — parses incoming text frames and routes them to
//! the message store.
//!
//! Wire format: requests are `{id, method, params}`, responses are
//! `{id, success, result? , error?: {code, message}}`. Three methods exist:
//! `message.send`, `message.hide`, and `thread.list`. All of them require an
//! authenticated scope; anonymous connections stay open but receive
//! `UNAUTHENTICATED` errors — the handshake never enforces authorization,
//! operations do.

use pitchline_core::ids::{IdentityId, MessageId};
use pitchline_core::ConnectionScope;
use pitchline_store::{MessageRepo, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::state::{with_store, AppState};

/// An incoming chat frame.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Request ID, echoed back in the response.
    pub id: String,
    /// Method name (`message.send`, `message.hide`, `thread.list`).
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing chat frame.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Echo of the request ID (`"unknown"` when the request failed to parse).
    pub id: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ChatErrorBody>,
}

/// Error payload of a failed chat call.
#[derive(Debug, Serialize)]
pub struct ChatErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ChatResponse {
    fn ok(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: impl Into<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            result: None,
            error: Some(ChatErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Serialize to a wire frame.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize chat response");
            String::new()
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendParams {
    recipient_id: i64,
    body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HideParams {
    message_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadListParams {
    peer_id: i64,
}

/// Handle one incoming text frame and return the response to send back.
#[instrument(skip_all, fields(method))]
pub async fn handle_frame(text: &str, scope: &ConnectionScope, state: &AppState) -> ChatResponse {
    let request: ChatRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!("invalid JSON frame received");
            return ChatResponse::error("unknown", "INVALID_PARAMS", format!("invalid JSON: {e}"));
        }
    };
    let _ = tracing::Span::current().record("method", request.method.as_str());
    debug!(method = %request.method, id = %request.id, "dispatching chat request");

    // Authorization happens here, per operation, never at the handshake.
    let Some(identity_id) = scope.identity_id() else {
        return ChatResponse::error(request.id, "UNAUTHENTICATED", "authentication required");
    };

    match request.method.as_str() {
        "message.send" => handle_send(request, identity_id, state).await,
        "message.hide" => handle_hide(request, identity_id, state).await,
        "thread.list" => handle_thread_list(request, identity_id, state).await,
        other => ChatResponse::error(
            request.id,
            "METHOD_NOT_FOUND",
            format!("method not found: {other}"),
        ),
    }
}

async fn handle_send(
    request: ChatRequest,
    identity_id: IdentityId,
    state: &AppState,
) -> ChatResponse {
    let params: SendParams = match parse_params(request.params) {
        Ok(p) => p,
        Err(e) => return ChatResponse::error(request.id, "INVALID_PARAMS", e),
    };
    if params.body.trim().is_empty() {
        return ChatResponse::error(request.id, "INVALID_PARAMS", "body must not be empty");
    }

    let recipient = IdentityId::new(params.recipient_id);
    let result = with_store(state.pool.clone(), move |conn| {
        MessageRepo::send(conn, identity_id, recipient, &params.body)
    })
    .await;

    match result {
        Ok(message) => {
            // Push to the recipient's live connections, best-effort
            let frame = json!({ "type": "message.received", "message": message });
            if let Ok(frame) = serde_json::to_string(&frame) {
                let _ = state.broadcast.send_to_identity(recipient, &frame).await;
            }
            ChatResponse::ok(request.id, json!({ "message": message }))
        }
        Err(e) => store_error_response(request.id, &e),
    }
}

async fn handle_hide(
    request: ChatRequest,
    identity_id: IdentityId,
    state: &AppState,
) -> ChatResponse {
    let params: HideParams = match parse_params(request.params) {
        Ok(p) => p,
        Err(e) => return ChatResponse::error(request.id, "INVALID_PARAMS", e),
    };
    let message_id = MessageId::from(params.message_id);
    let result = with_store(state.pool.clone(), {
        let message_id = message_id.clone();
        move |conn| MessageRepo::hide_for(conn, identity_id, &message_id)
    })
    .await;

    match result {
        Ok(()) => ChatResponse::ok(
            request.id,
            json!({ "messageId": message_id, "hidden": true }),
        ),
        Err(e) => store_error_response(request.id, &e),
    }
}

async fn handle_thread_list(
    request: ChatRequest,
    identity_id: IdentityId,
    state: &AppState,
) -> ChatResponse {
    let params: ThreadListParams = match parse_params(request.params) {
        Ok(p) => p,
        Err(e) => return ChatResponse::error(request.id, "INVALID_PARAMS", e),
    };
    let peer = IdentityId::new(params.peer_id);
    let result = with_store(state.pool.clone(), move |conn| {
        match MessageRepo::thread_for(conn, identity_id, peer)? {
            Some(thread_id) => {
                let messages = MessageRepo::list_visible(conn, identity_id, &thread_id)?;
                Ok((Some(thread_id), messages))
            }
            None => Ok((None, Vec::new())),
        }
    })
    .await;

    match result {
        Ok((thread_id, messages)) => ChatResponse::ok(
            request.id,
            json!({ "threadId": thread_id, "messages": messages }),
        ),
        Err(e) => store_error_response(request.id, &e),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    let params = params.ok_or_else(|| "missing params".to_string())?;
    serde_json::from_value(params).map_err(|e| format!("invalid params: {e}"))
}

fn store_error_response(id: String, error: &StoreError) -> ChatResponse {
    match error {
        StoreError::NotFound(m) => ChatResponse::error(id, "NOT_FOUND", m.clone()),
        StoreError::Conflict(m) => ChatResponse::error(id, "CONFLICT", m.clone()),
        other => {
            warn!(error = %other, "store failure handling chat request");
            ChatResponse::error(id, "INTERNAL_ERROR", "internal error")
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
