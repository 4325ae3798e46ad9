//! Connection handshake authentication.
//!
//! Resolves the `Authorization` header of a WebSocket upgrade request to a
//! [`ConnectionScope`] before the socket handler takes over. The handshake
//! is never rejected here: a missing credential, a malformed bearer value,
//! a token that fails verification, an unknown identity, or any storage
//! failure all degrade to [`ConnectionScope::Anonymous`]. Authorization
//! decisions based on the resolved scope happen strictly downstream, per
//! operation.
//!
//! Every handshake starts from fresh state — nothing is cached between
//! attempts on the same link. The identity lookup runs on the blocking
//! thread pool so the event loop never stalls on `SQLite`; if the client
//! drops mid-handshake the whole future is dropped and no scope is ever
//! attached.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use pitchline_auth::TokenService;
use pitchline_core::ids::{IdentityId, OrganizationId};
use pitchline_core::{AuthenticatedContext, ConnectionScope};
use pitchline_store::{ConnectionPool, IdentityRepo, OrganizationRepo};
use tracing::{debug, warn};

/// Extract the bearer token from a header map.
///
/// Absence or a malformed prefix is "no credential", not an error.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Resolve the handshake headers to a [`ConnectionScope`].
pub async fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    pool: &ConnectionPool,
) -> ConnectionScope {
    let Some(token) = bearer_token(headers) else {
        return ConnectionScope::Anonymous;
    };

    let claims = match tokens.verify_access(token) {
        Ok(claims) => claims,
        Err(_) => {
            // Degrade, never abort: the connection proceeds as anonymous and
            // the failure mode is not revealed to the client.
            debug!("handshake credential failed verification, continuing as anonymous");
            return ConnectionScope::Anonymous;
        }
    };

    let identity_id = claims.identity();
    let organization_id = claims.organization_id();
    match resolve_identity(pool.clone(), identity_id, organization_id).await {
        Ok(Some(ctx)) => ConnectionScope::Authenticated(ctx),
        Ok(None) => ConnectionScope::Anonymous,
        Err(e) => {
            warn!(%identity_id, error = %e, "identity resolution failed, continuing as anonymous");
            ConnectionScope::Anonymous
        }
    }
}

/// Look up the identity (and its organization relation, when the token
/// carries an `organization_id` claim) on the blocking thread pool.
async fn resolve_identity(
    pool: ConnectionPool,
    identity_id: IdentityId,
    organization_id: Option<OrganizationId>,
) -> Result<Option<AuthenticatedContext>, String> {
    let result = tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let Some(identity) =
            IdentityRepo::find_by_id(&conn, identity_id).map_err(|e| e.to_string())?
        else {
            return Ok(None);
        };
        if !identity.is_active {
            return Ok(None);
        }
        let organization_relation = match organization_id {
            Some(org) => OrganizationRepo::relation_for(&conn, identity_id, org)
                .map_err(|e| e.to_string())?,
            None => None,
        };
        Ok(Some(AuthenticatedContext {
            identity,
            organization_relation,
        }))
    })
    .await;
    // A join failure (panic or cancellation inside the pool) is just another
    // path to anonymous.
    result.map_err(|e| e.to_string())?
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pitchline_auth::AuthConfig;
    use pitchline_core::Position;
    use pitchline_store::{
        new_in_memory, run_migrations, NewIdentity, NewOrganization, PoolConfig,
    };

    fn make_pool() -> ConnectionPool {
        let pool = new_in_memory(&PoolConfig::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            let _ = run_migrations(&conn).unwrap();
        }
        pool
    }

    fn make_tokens() -> TokenService {
        TokenService::new(&AuthConfig {
            secret: "test-secret".into(),
            ..AuthConfig::default()
        })
    }

    fn make_identity(pool: &ConnectionPool, email: &str) -> pitchline_core::Identity {
        let conn = pool.get().unwrap();
        IdentityRepo::create(
            &conn,
            &NewIdentity {
                email: email.into(),
                password: "pw".into(),
                first_name: "A".into(),
                surname: "B".into(),
                phone_number: "-".into(),
            },
        )
        .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("bearer abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let scope = authenticate(&HeaderMap::new(), &make_tokens(), &make_pool()).await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn malformed_bearer_is_anonymous() {
        let scope = authenticate(
            &headers_with("Token abc"),
            &make_tokens(),
            &make_pool(),
        )
        .await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn invalid_token_is_anonymous() {
        let scope = authenticate(
            &headers_with("Bearer not.a.token"),
            &make_tokens(),
            &make_pool(),
        )
        .await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_anonymous() {
        let pool = make_pool();
        let identity = make_identity(&pool, "ada@example.com");
        let other = TokenService::new(&AuthConfig {
            secret: "other-secret".into(),
            ..AuthConfig::default()
        });
        let token = other.issue_access(&identity).unwrap();
        let scope = authenticate(
            &headers_with(&format!("Bearer {token}")),
            &make_tokens(),
            &pool,
        )
        .await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn unknown_identity_is_anonymous() {
        let pool = make_pool();
        let tokens = make_tokens();
        // Identity exists only long enough to mint the token shape; use an
        // ID that is not in the store.
        let ghost = pitchline_core::Identity {
            id: IdentityId::new(4040),
            email: "ghost@example.com".into(),
            first_name: "G".into(),
            surname: "H".into(),
            phone_number: "-".into(),
            registration_date: chrono::Utc::now(),
            is_verified: false,
            is_active: true,
        };
        let token = tokens.issue_access(&ghost).unwrap();
        let scope = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &pool).await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let pool = make_pool();
        let tokens = make_tokens();
        let identity = make_identity(&pool, "ada@example.com");
        let token = tokens.issue_access(&identity).unwrap();
        let scope = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &pool).await;
        assert_eq!(scope.identity_id(), Some(identity.id));
        assert!(scope.organization_relation().is_none());
    }

    #[tokio::test]
    async fn refresh_token_does_not_authenticate() {
        let pool = make_pool();
        let tokens = make_tokens();
        let identity = make_identity(&pool, "ada@example.com");
        let refresh = tokens.issue_refresh(&identity).unwrap();
        let scope =
            authenticate(&headers_with(&format!("Bearer {refresh}")), &tokens, &pool).await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn inactive_identity_is_anonymous() {
        let pool = make_pool();
        let tokens = make_tokens();
        let identity = make_identity(&pool, "ada@example.com");
        let token = tokens.issue_access(&identity).unwrap();
        {
            let conn = pool.get().unwrap();
            let _ = conn
                .execute(
                    "UPDATE identities SET is_active = 0 WHERE identity_id = ?1",
                    rusqlite::params![identity.id.get()],
                )
                .unwrap();
        }
        let scope = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &pool).await;
        assert_eq!(scope, ConnectionScope::Anonymous);
    }

    #[tokio::test]
    async fn organization_claim_resolves_relation() {
        let pool = make_pool();
        let tokens = make_tokens();
        let identity = make_identity(&pool, "founder@example.com");
        let org = {
            let conn = pool.get().unwrap();
            let org = OrganizationRepo::create(
                &conn,
                &NewOrganization {
                    brand: "Acme".into(),
                    is_startup: true,
                    ..NewOrganization::default()
                },
            )
            .unwrap();
            let _ = OrganizationRepo::relate(&conn, identity.id, org.id, Position::Founder)
                .unwrap();
            org
        };
        let token = tokens.issue_access(&identity).unwrap();
        let token = tokens.attach_organization(&token, org.id).unwrap();

        let scope = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &pool).await;
        let relation = scope.organization_relation().expect("relation resolved");
        assert_eq!(relation.organization_id, org.id);
        assert_eq!(relation.position, Position::Founder);
    }

    #[tokio::test]
    async fn stale_organization_claim_still_authenticates_without_relation() {
        let pool = make_pool();
        let tokens = make_tokens();
        let identity = make_identity(&pool, "ada@example.com");
        let token = tokens.issue_access(&identity).unwrap();
        let token = tokens
            .attach_organization(&token, OrganizationId::new(999))
            .unwrap();

        let scope = authenticate(&headers_with(&format!("Bearer {token}")), &tokens, &pool).await;
        assert_eq!(scope.identity_id(), Some(identity.id));
        assert!(scope.organization_relation().is_none());
    }
}
