//! [`Dispatcher`] — compose and fan out notifications after write actions.

use std::sync::Arc;

use pitchline_core::ids::{IdentityId, OrganizationId};
use tracing::{debug, warn};

use crate::errors::DispatchError;
use crate::traits::{DeliveryChannel, MemberDirectory, SubscriberDirectory};
use crate::types::{Notification, NotificationKind};

/// Composes notifications and submits best-effort delivery attempts.
///
/// Handlers invoke the dispatcher explicitly after their action succeeds —
/// there is no interception. The `notify_*` methods never fail: failures are
/// logged and swallowed so they cannot reach the triggering action's caller.
pub struct Dispatcher {
    members: Arc<dyn MemberDirectory>,
    subscribers: Arc<dyn SubscriberDirectory>,
    channel: Arc<dyn DeliveryChannel>,
}

impl Dispatcher {
    /// Create a dispatcher over the given directories and delivery channel.
    pub fn new(
        members: Arc<dyn MemberDirectory>,
        subscribers: Arc<dyn SubscriberDirectory>,
        channel: Arc<dyn DeliveryChannel>,
    ) -> Self {
        Self {
            members,
            subscribers,
            channel,
        }
    }

    /// Notify an organization's members that `actor` subscribed to it.
    pub async fn notify_subscribed(&self, actor: IdentityId, organization_id: OrganizationId) {
        if let Err(e) = self.dispatch_subscription(actor, organization_id).await {
            warn!(%actor, %organization_id, error = %e, "subscription notification dropped");
        }
    }

    /// Notify an organization's subscribers that its content was updated.
    pub async fn notify_content_updated(
        &self,
        actor: IdentityId,
        organization_id: OrganizationId,
    ) {
        if let Err(e) = self.dispatch_content_update(actor, organization_id).await {
            warn!(%actor, %organization_id, error = %e, "content-update notification dropped");
        }
    }

    async fn dispatch_subscription(
        &self,
        actor: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<(), DispatchError> {
        let audience = self.members.member_ids(organization_id).await?;
        let notification = Notification::compose(
            NotificationKind::Subscription,
            actor,
            organization_id,
            audience,
            "You have a new subscriber",
        );
        self.fan_out(&notification).await;
        Ok(())
    }

    async fn dispatch_content_update(
        &self,
        actor: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<(), DispatchError> {
        let audience = self.subscribers.subscriber_ids(organization_id).await?;
        let notification = Notification::compose(
            NotificationKind::ContentUpdate,
            actor,
            organization_id,
            audience,
            "An organization you follow published an update",
        );
        self.fan_out(&notification).await;
        Ok(())
    }

    /// Submit one attempt per audience member. A failed submission is logged
    /// and does not stop delivery to the rest of the audience.
    async fn fan_out(&self, notification: &Notification) {
        debug!(
            id = %notification.id,
            kind = ?notification.kind,
            recipients = notification.audience.len(),
            "fanning out notification"
        );
        for recipient in &notification.audience {
            if let Err(e) = self.channel.submit(*recipient, notification).await {
                warn!(
                    id = %notification.id,
                    %recipient,
                    error = %e,
                    "notification delivery attempt failed"
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
