//! Subscription create/delete, with notification dispatch on create.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use pitchline_core::ids::OrganizationId;
use pitchline_store::SubscriptionRepo;
use serde_json::{json, Value};

use super::require_identity;
use crate::errors::ApiError;
use crate::state::{with_store, AppState};

/// `POST /api/organizations/{id}/subscriptions` — subscribe the caller.
///
/// A duplicate subscription is a 409 and dispatches nothing. On success the
/// `SUBSCRIPTION` notification is dispatched on a separate task, strictly
/// after the subscription is committed; the response is already decided and
/// cannot be affected.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(organization_id): Path<i64>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let identity = require_identity(&headers, &state).await?;
    let organization_id = OrganizationId::new(organization_id);

    let identity_id = identity.id;
    with_store(state.pool.clone(), move |conn| {
        SubscriptionRepo::subscribe(conn, identity_id, organization_id)
    })
    .await?;

    let dispatcher = state.dispatcher.clone();
    let _ = tokio::spawn(async move {
        dispatcher.notify_subscribed(identity_id, organization_id).await;
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({ "organizationId": organization_id, "subscribed": true })),
    ))
}

/// `DELETE /api/organizations/{id}/subscriptions` — unsubscribe the caller.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(organization_id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let identity = require_identity(&headers, &state).await?;
    let organization_id = OrganizationId::new(organization_id);

    let identity_id = identity.id;
    let removed = with_store(state.pool.clone(), move |conn| {
        SubscriptionRepo::unsubscribe(conn, identity_id, organization_id)
    })
    .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "no subscription to organization {organization_id}"
        )))
    }
}
