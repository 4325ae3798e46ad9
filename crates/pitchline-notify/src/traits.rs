//! Seams between the dispatcher and its collaborators.
//!
//! Adapters over the real store and transport live in the server crate;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use pitchline_core::ids::{IdentityId, OrganizationId};

use crate::errors::DispatchError;
use crate::types::Notification;

/// Resolves the identities holding an active subscription to an
/// organization. Audience of `CONTENT_UPDATE` notifications.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Subscriber identity IDs for the organization.
    async fn subscriber_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<IdentityId>, DispatchError>;
}

/// Resolves the identities related to an organization (founders and
/// representatives). Audience of `SUBSCRIPTION` notifications.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Member identity IDs for the organization.
    async fn member_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<IdentityId>, DispatchError>;
}

/// Outbound delivery mechanism (push to open connections, queued email, …).
///
/// The dispatcher only guarantees composition and submission; delivery
/// confirmation is the transport's concern.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Submit one delivery attempt for one recipient.
    async fn submit(
        &self,
        recipient: IdentityId,
        notification: &Notification,
    ) -> Result<(), DispatchError>;
}
