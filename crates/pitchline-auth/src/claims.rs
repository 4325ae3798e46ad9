//! Token claim set.

use pitchline_core::ids::{IdentityId, OrganizationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token purpose, embedded as the `token_type` claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential for requests and connection handshakes.
    Access,
    /// Longer-lived credential used solely to mint new access tokens.
    Refresh,
}

/// Claim names that augmentation may never override: the identity binding,
/// the validity window, and the token purpose.
pub const RESERVED_CLAIMS: &[&str] = &["identity_id", "iat", "exp", "token_type"];

/// The signed payload of a session token.
///
/// `identity_id`, the validity window, and `token_type` are mandatory;
/// everything else lives in `extra` and is carried verbatim through
/// augmentation (notably `organization_id`, attached after an organization
/// context is selected).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The identity this token is bound to.
    pub identity_id: i64,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
    /// Token purpose.
    pub token_type: TokenKind,
    /// Supplementary claims.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Claims {
    /// The identity binding as a typed ID.
    #[must_use]
    pub fn identity(&self) -> IdentityId {
        IdentityId::new(self.identity_id)
    }

    /// The `organization_id` supplementary claim, if present.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.extra
            .get("organization_id")
            .and_then(Value::as_i64)
            .map(OrganizationId::new)
    }

    /// A supplementary claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
