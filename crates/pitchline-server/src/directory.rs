//! Store-backed audience directories for the notification dispatcher.

use async_trait::async_trait;
use pitchline_core::ids::{IdentityId, OrganizationId};
use pitchline_notify::{DispatchError, MemberDirectory, SubscriberDirectory};
use pitchline_store::{ConnectionPool, OrganizationRepo, SubscriptionRepo};

use crate::state::with_store;

/// Resolves organization members through the relation table.
pub struct StoreMemberDirectory {
    pool: ConnectionPool,
}

impl StoreMemberDirectory {
    /// Create a directory over a connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberDirectory for StoreMemberDirectory {
    async fn member_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<IdentityId>, DispatchError> {
        with_store(self.pool.clone(), move |conn| {
            OrganizationRepo::member_ids(conn, organization_id)
        })
        .await
        .map_err(|e| DispatchError::Audience {
            reason: e.to_string(),
        })
    }
}

/// Resolves active subscribers through the subscription table.
pub struct StoreSubscriberDirectory {
    pool: ConnectionPool,
}

impl StoreSubscriberDirectory {
    /// Create a directory over a connection pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberDirectory for StoreSubscriberDirectory {
    async fn subscriber_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<IdentityId>, DispatchError> {
        with_store(self.pool.clone(), move |conn| {
            SubscriptionRepo::subscriber_ids(conn, organization_id)
        })
        .await
        .map_err(|e| DispatchError::Audience {
            reason: e.to_string(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
