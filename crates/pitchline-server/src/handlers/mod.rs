//! REST request handlers.
//!
//! Thin glue over the token service, the repositories, and the notification
//! dispatcher. Handlers invoke the dispatcher explicitly after a successful
//! write — the dispatch runs on its own task and can never change the
//! response.

pub mod auth;
pub mod content;
pub mod subscriptions;

use axum::http::HeaderMap;
use pitchline_core::Identity;
use pitchline_store::IdentityRepo;

use crate::errors::ApiError;
use crate::state::{with_store, AppState};
use crate::websocket::authenticator::bearer_token;

/// Resolve the request's bearer token to a live identity.
///
/// Unlike the connection authenticator this is fail-closed: a missing or
/// invalid credential, an unknown identity, or an inactive account all
/// reject the request with the same generic 401.
pub(crate) async fn require_identity(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Identity, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;
    let claims = state.tokens.verify_access(token)?;
    let identity_id = claims.identity();
    let identity = with_store(state.pool.clone(), move |conn| {
        IdentityRepo::find_by_id(conn, identity_id)
    })
    .await?
    .ok_or(ApiError::Unauthenticated)?;
    if !identity.is_active {
        return Err(ApiError::Unauthenticated);
    }
    Ok(identity)
}
