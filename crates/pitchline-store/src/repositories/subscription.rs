//! Subscription repository — standing investor → organization relations.
//!
//! At most one active subscription exists per (identity, organization) pair;
//! the table's primary key enforces it.

use chrono::Utc;
use pitchline_core::ids::{IdentityId, OrganizationId};
use rusqlite::{params, Connection};
use tracing::instrument;

use crate::errors::{Result, StoreError};

/// Subscription repository — stateless, every method takes `&Connection`.
pub struct SubscriptionRepo;

impl SubscriptionRepo {
    /// Subscribe an identity to an organization.
    ///
    /// Fails with [`StoreError::NotFound`] when the organization does not
    /// exist and [`StoreError::Conflict`] on a duplicate subscription.
    #[instrument(skip(conn))]
    pub fn subscribe(
        conn: &Connection,
        identity_id: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<()> {
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM organizations WHERE organization_id = ?1",
            params![organization_id.get()],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(StoreError::NotFound(format!(
                "organization {organization_id}"
            )));
        }

        let inserted = conn.execute(
            "INSERT INTO subscriptions (identity_id, organization_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![
                identity_id.get(),
                organization_id.get(),
                Utc::now().to_rfc3339()
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(format!(
                    "identity {identity_id} already subscribed to organization {organization_id}"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a subscription. Returns whether one existed.
    #[instrument(skip(conn))]
    pub fn unsubscribe(
        conn: &Connection,
        identity_id: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<bool> {
        let deleted = conn.execute(
            "DELETE FROM subscriptions WHERE identity_id = ?1 AND organization_id = ?2",
            params![identity_id.get(), organization_id.get()],
        )?;
        Ok(deleted > 0)
    }

    /// Whether a subscription exists.
    pub fn is_subscribed(
        conn: &Connection,
        identity_id: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE identity_id = ?1 AND organization_id = ?2",
            params![identity_id.get(), organization_id.get()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// IDs of all identities subscribed to an organization. Audience of
    /// content-update notifications.
    pub fn subscriber_ids(
        conn: &Connection,
        organization_id: OrganizationId,
    ) -> Result<Vec<IdentityId>> {
        let mut stmt = conn.prepare(
            "SELECT identity_id FROM subscriptions WHERE organization_id = ?1 ORDER BY identity_id",
        )?;
        let ids = stmt
            .query_map(params![organization_id.get()], |row| {
                Ok(IdentityId::new(row.get(0)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
