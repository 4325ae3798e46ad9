//! User principals and per-connection authentication state.
//!
//! An [`Identity`] is the canonical user record. Organizational attachment is
//! an explicit [`OrganizationRelation`] value — an identity without one is
//! simply not affiliated, there is no null sentinel.
//!
//! [`ConnectionScope`] is the state attached to every live WebSocket
//! connection at handshake time: either a resolved [`AuthenticatedContext`]
//! or [`ConnectionScope::Anonymous`]. Exactly one scope exists per
//! connection; it is dropped with the connection and never shared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{IdentityId, OrganizationId, RelationId};

/// A user principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique row ID.
    pub id: IdentityId,
    /// Unique email address (login name).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub surname: String,
    /// Contact phone number.
    pub phone_number: String,
    /// When the account was registered.
    pub registration_date: DateTime<Utc>,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Whether the account is active (inactive accounts cannot log in).
    pub is_active: bool,
}

impl Identity {
    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }
}

/// Role an identity holds within an organization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Founded the organization.
    Founder,
    /// Acts on behalf of the organization.
    Representative,
}

impl Position {
    /// Stable storage tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Representative => "representative",
        }
    }

    /// Parse a storage tag.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "founder" => Some(Self::Founder),
            "representative" => Some(Self::Representative),
            _ => None,
        }
    }
}

/// Link between an identity and an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRelation {
    /// Unique row ID.
    pub relation_id: RelationId,
    /// The related identity.
    pub identity_id: IdentityId,
    /// The related organization.
    pub organization_id: OrganizationId,
    /// Role within the organization.
    pub position: Position,
}

/// A fully resolved authenticated caller: the identity plus the
/// organizational relation selected for this session, if any.
///
/// The relation is carried here rather than mutated onto [`Identity`] so the
/// same identity record can appear in multiple connections with different
/// active organization contexts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedContext {
    /// The resolved identity.
    pub identity: Identity,
    /// Active organization relation, if an organization context was selected.
    pub organization_relation: Option<OrganizationRelation>,
}

/// Per-connection authentication state, created at handshake time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionScope {
    /// No credential presented, or the credential did not resolve.
    Anonymous,
    /// Credential verified and the identity resolved.
    Authenticated(AuthenticatedContext),
}

impl ConnectionScope {
    /// Whether this scope carries a resolved identity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The resolved identity, if authenticated.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(ctx) => Some(&ctx.identity),
        }
    }

    /// The resolved identity ID, if authenticated.
    #[must_use]
    pub fn identity_id(&self) -> Option<IdentityId> {
        self.identity().map(|i| i.id)
    }

    /// The active organization relation, if any.
    #[must_use]
    pub fn organization_relation(&self) -> Option<&OrganizationRelation> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(ctx) => ctx.organization_relation.as_ref(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
