//! Notification records.

use chrono::{DateTime, Utc};
use pitchline_core::ids::{IdentityId, NotificationId, OrganizationId};
use serde::{Deserialize, Serialize};

/// What triggered a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A new subscription to an organization.
    Subscription,
    /// Content owned by an organization was updated.
    ContentUpdate,
}

/// A composed notification, immutable after creation.
///
/// Consumed by delivery and then archived or discarded per retention policy;
/// retention is not decided here.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique ID (time-ordered).
    pub id: NotificationId,
    /// Trigger kind.
    pub kind: NotificationKind,
    /// Identity whose action triggered the notification.
    pub actor: IdentityId,
    /// Organization the trigger concerns.
    pub organization_id: OrganizationId,
    /// Target audience, as computed at dispatch time.
    pub audience: Vec<IdentityId>,
    /// Short human-readable summary.
    pub summary: String,
    /// When the notification was composed.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Compose a notification for an audience.
    #[must_use]
    pub fn compose(
        kind: NotificationKind,
        actor: IdentityId,
        organization_id: OrganizationId,
        audience: Vec<IdentityId>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            actor,
            organization_id,
            audience,
            summary: summary.into(),
            created_at: Utc::now(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_tags() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::Subscription).unwrap(),
            "\"SUBSCRIPTION\""
        );
        assert_eq!(
            serde_json::to_string(&NotificationKind::ContentUpdate).unwrap(),
            "\"CONTENT_UPDATE\""
        );
    }

    #[test]
    fn compose_fills_id_and_timestamp() {
        let n = Notification::compose(
            NotificationKind::Subscription,
            IdentityId::new(1),
            OrganizationId::new(2),
            vec![IdentityId::new(3)],
            "new subscriber",
        );
        assert!(!n.id.as_str().is_empty());
        assert_eq!(n.audience, vec![IdentityId::new(3)]);
    }

    #[test]
    fn notification_serializes_camel_case() {
        let n = Notification::compose(
            NotificationKind::ContentUpdate,
            IdentityId::new(1),
            OrganizationId::new(2),
            vec![],
            "profile updated",
        );
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "CONTENT_UPDATE");
        assert!(json.get("organizationId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
