//! Login, token rotation, and organization-context selection.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use pitchline_auth::TokenPair;
use pitchline_core::ids::OrganizationId;
use pitchline_store::{IdentityRepo, LoginActivityRepo, LoginStatus, OrganizationRepo};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::{with_store, AppState};
use crate::websocket::authenticator::bearer_token;

/// `POST /api/auth/login` request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// `POST /api/auth/refresh` request body.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token to rotate.
    pub refresh: String,
}

/// `POST /api/auth/organization` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOrganizationRequest {
    /// Organization to activate as the caller's context.
    pub organization_id: i64,
}

/// `POST /api/auth/login` — check credentials and issue a token pair.
///
/// Every failure collapses into the same generic 401: wrong password,
/// unknown email, and inactive account are indistinguishable to the caller.
/// The attempt is recorded in the login activity log best-effort; a failure
/// to record never affects the response.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    let email = request.email.clone();
    let identity = with_store(state.pool.clone(), move |conn| {
        let identity = IdentityRepo::authenticate(conn, &request.email, &request.password)?;
        let status = if identity.is_some() {
            LoginStatus::Success
        } else {
            LoginStatus::Failed
        };
        if let Err(e) =
            LoginActivityRepo::record(conn, &request.email, ip.as_deref(), &user_agent, status)
        {
            warn!(error = %e, "failed to record login activity");
        }
        Ok(identity)
    })
    .await?;

    match identity {
        Some(identity) => Ok(Json(state.tokens.issue_pair(&identity)?)),
        None => {
            warn!(%email, "login rejected");
            Err(ApiError::Unauthenticated)
        }
    }
}

/// `POST /api/auth/refresh` — rotate a refresh token into a fresh pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    Ok(Json(state.tokens.rotate(&request.refresh)?))
}

/// `POST /api/auth/organization` — activate an organization context.
///
/// Verifies the caller's relation to the organization and returns the access
/// token re-signed with the `organization_id` claim attached. The original
/// token stays valid; augmentation never mutates it.
pub async fn select_organization(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SelectOrganizationRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or(ApiError::Unauthenticated)?
        .to_string();
    let claims = state.tokens.verify_access(&token)?;
    let identity_id = claims.identity();
    let organization_id = OrganizationId::new(request.organization_id);

    let relation = with_store(state.pool.clone(), move |conn| {
        OrganizationRepo::relation_for(conn, identity_id, organization_id)
    })
    .await?;
    if relation.is_none() {
        return Err(ApiError::Forbidden);
    }

    let access = state.tokens.attach_organization(&token, organization_id)?;
    Ok(Json(json!({ "access": access })))
}
