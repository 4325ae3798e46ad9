//! Organization content updates, with notification dispatch to subscribers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use pitchline_core::ids::OrganizationId;
use pitchline_core::Organization;
use pitchline_store::{ContentUpdate, OrganizationRepo};

use super::require_identity;
use crate::errors::ApiError;
use crate::state::{with_store, AppState};

/// `PUT /api/organizations/{id}/content` — update the profile's content.
///
/// Only identities holding a relation to the organization may edit it. On
/// success the `CONTENT_UPDATE` notification fans out to the organization's
/// subscribers on a separate task, strictly after the update committed.
pub async fn update_content(
    State(state): State<AppState>,
    Path(organization_id): Path<i64>,
    headers: HeaderMap,
    Json(update): Json<ContentUpdate>,
) -> Result<Json<Organization>, ApiError> {
    let identity = require_identity(&headers, &state).await?;
    let organization_id = OrganizationId::new(organization_id);

    let identity_id = identity.id;
    let organization = with_store(state.pool.clone(), move |conn| {
        if OrganizationRepo::relation_for(conn, identity_id, organization_id)?.is_none() {
            // Signalled with a sentinel so the permission failure is
            // distinguishable from a missing organization.
            return Ok(None);
        }
        OrganizationRepo::update_content(conn, organization_id, &update).map(Some)
    })
    .await?
    .ok_or(ApiError::Forbidden)?;

    let dispatcher = state.dispatcher.clone();
    let _ = tokio::spawn(async move {
        dispatcher
            .notify_content_updated(identity_id, organization_id)
            .await;
    });

    Ok(Json(organization))
}
