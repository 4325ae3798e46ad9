//! [`TokenService`] — issue, verify, rotate, and augment session tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pitchline_core::ids::OrganizationId;
use pitchline_core::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::claims::{Claims, TokenKind, RESERVED_CLAIMS};
use crate::errors::AuthError;

/// Token service configuration.
///
/// The secret is loaded at startup and never mutated afterwards; every
/// service instance owns its keys, so tests can construct instances with
/// distinct secrets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub secret: String,
    /// Access token lifetime in seconds (default 900 = 15 minutes).
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds (default 604800 = 7 days).
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
        }
    }
}

/// A freshly minted (refresh, access) token pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access: String,
    /// Longer-lived refresh token.
    pub refresh: String,
}

/// Issues, verifies, augments, and rotates signed session tokens.
///
/// Pure and synchronous: every method completes without suspending and
/// without locking, so the service can be shared freely across tasks.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a service from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    /// Issue a short-lived access token for an identity.
    pub fn issue_access(&self, identity: &Identity) -> Result<String, AuthError> {
        self.mint(identity.id.get(), TokenKind::Access)
    }

    /// Issue a refresh token for an identity.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, AuthError> {
        self.mint(identity.id.get(), TokenKind::Refresh)
    }

    /// Issue a (refresh, access) pair for an identity, as returned by login.
    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue_access(identity)?,
            refresh: self.issue_refresh(identity)?,
        })
    }

    /// Verify an access token and return its claims.
    ///
    /// Fails with [`AuthError::InvalidToken`] on signature mismatch, passed
    /// expiry, malformed structure, or a refresh token presented as access.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token, TokenKind::Access)
    }

    /// Verify a refresh token and mint a fresh pair for the same identity.
    ///
    /// Same failure taxonomy as [`Self::verify_access`], including an access
    /// token presented as refresh.
    pub fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.decode(refresh_token, TokenKind::Refresh)?;
        Ok(TokenPair {
            access: self.mint(claims.identity_id, TokenKind::Access)?,
            refresh: self.mint(claims.identity_id, TokenKind::Refresh)?,
        })
    }

    /// Merge supplementary claims into an access token and re-sign it.
    ///
    /// The input token must verify (unexpired, access purpose). Same-named
    /// supplementary claims are overwritten; everything else — including the
    /// identity binding and the original expiry — is preserved. Attempts to
    /// override a reserved claim are ignored. The input token is untouched;
    /// a new token string is returned.
    pub fn augment(
        &self,
        token: &str,
        extra: &serde_json::Map<String, Value>,
    ) -> Result<String, AuthError> {
        let mut claims = self.decode(token, TokenKind::Access)?;
        for (name, value) in extra {
            if RESERVED_CLAIMS.contains(&name.as_str()) {
                debug!(claim = %name, "ignoring attempt to override reserved claim");
                continue;
            }
            let _ = claims.extra.insert(name.clone(), value.clone());
        }
        self.encode(&claims)
    }

    /// Attach an organization context to an access token.
    ///
    /// Affiliation is resolved after login (a separate step selects the
    /// active organization), so the token is re-signed with the merged claim
    /// rather than forcing a re-authentication.
    pub fn attach_organization(
        &self,
        token: &str,
        organization_id: OrganizationId,
    ) -> Result<String, AuthError> {
        let mut extra = serde_json::Map::new();
        let _ = extra.insert("organization_id".into(), Value::from(organization_id.get()));
        self.augment(token, &extra)
    }

    fn mint(&self, identity_id: i64, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        };
        self.encode(&Claims {
            identity_id,
            iat: now,
            exp: now + ttl,
            token_type: kind,
            extra: serde_json::Map::new(),
        })
    }

    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            AuthError::Signing {
                reason: e.to_string(),
            }
        })
    }

    fn decode(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        if data.claims.token_type != expected {
            return Err(AuthError::InvalidToken);
        }
        Ok(data.claims)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
