//! Routes keyword matches to direct messages.
//!
//! # Flow
//!
//! ```text
//! MatchResult --[per owner]--> member lookup --> can_view? --> identity lookup
//!                                                                   |
//!                                                                   v
//!                                           one DM per matched keyword
//! ```
//!
//! Owners are handled independently: a lookup failure, a permission denial
//! or a refused DM only ever affects the owner it belongs to.

use super::cache::ResolutionCache;
use super::payload::Notification;
use crate::matching::MatchResult;
use crate::models::{IncomingMessage, ServerId, UserId};
use crate::platform::{
    DeliveryOutcome, IdentityResolver, MemberDirectory, NotificationChannel, PermissionOracle,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Counts of what happened to one message's matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Owners considered.
    pub owners: usize,
    /// Owners skipped because they were not members or could not be found.
    pub unresolved: usize,
    /// Owners skipped because they cannot view the channel.
    pub denied: usize,
    /// Notifications the platform accepted.
    pub delivered: usize,
    /// Owners whose DMs were refused.
    pub refused: usize,
    /// Deliveries abandoned on a transport error.
    pub failed: usize,
}

/// Sends notifications for matched keywords.
pub struct NotificationDispatcher {
    members: Arc<dyn MemberDirectory>,
    permissions: Arc<dyn PermissionOracle>,
    identities: Arc<dyn IdentityResolver>,
    channel: Arc<dyn NotificationChannel>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over the given platform collaborators.
    #[must_use]
    pub fn new(
        members: Arc<dyn MemberDirectory>,
        permissions: Arc<dyn PermissionOracle>,
        identities: Arc<dyn IdentityResolver>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            members,
            permissions,
            identities,
            channel,
        }
    }

    /// Notifies every owner in `matches` about `message`.
    ///
    /// Never fails: per-owner problems are logged and counted in the
    /// returned summary.
    pub async fn dispatch(
        &self,
        message: &IncomingMessage,
        server: ServerId,
        matches: &MatchResult,
    ) -> DispatchSummary {
        let start = Instant::now();
        let mut cache = ResolutionCache::new();
        let mut summary = DispatchSummary::default();

        let mut owners: Vec<_> = matches.iter().collect();
        owners.sort_unstable_by_key(|(owner, _)| *owner);

        for (owner, keywords) in owners {
            summary.owners += 1;
            self.notify_owner(message, server, owner, keywords, &mut cache, &mut summary)
                .await;
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("keyword_dispatch_duration_ms").record(duration_ms);
        tracing::debug!(
            message_id = %message.id,
            owners = summary.owners,
            delivered = summary.delivered,
            lookups = cache.lookups(),
            duration_ms,
            "Dispatch finished"
        );

        summary
    }

    async fn notify_owner(
        &self,
        message: &IncomingMessage,
        server: ServerId,
        owner: UserId,
        keywords: &BTreeSet<String>,
        cache: &mut ResolutionCache,
        summary: &mut DispatchSummary,
    ) {
        let Some(member) = cache.member(self.members.as_ref(), server, owner).await else {
            tracing::info!(
                user_id = %owner,
                guild_id = %server,
                "Member not found"
            );
            summary.unresolved += 1;
            return;
        };

        if !self.permissions.can_view(&member, message.channel_id) {
            tracing::info!(
                user_id = %owner,
                channel_id = %message.channel_id,
                "Permission denied"
            );
            summary.denied += 1;
            return;
        }

        let Some(recipient) = cache.identity(self.identities.as_ref(), owner).await else {
            tracing::info!(user_id = %owner, "User fetch failed");
            summary.unresolved += 1;
            return;
        };

        for keyword in keywords {
            let notification = Notification::for_match(message, keyword);
            match self.channel.send_direct(&recipient, &notification).await {
                Ok(DeliveryOutcome::Delivered) => {
                    record_outcome(DeliveryOutcome::Delivered.as_str());
                    summary.delivered += 1;
                    tracing::info!(
                        user_id = %owner,
                        guild_id = %server,
                        channel_id = %message.channel_id,
                        keyword = %keyword,
                        "DM sent"
                    );
                },
                Ok(DeliveryOutcome::Refused) => {
                    record_outcome(DeliveryOutcome::Refused.as_str());
                    summary.refused += 1;
                    tracing::info!(user_id = %owner, keyword = %keyword, "DM forbidden");
                    break;
                },
                Err(e) => {
                    record_outcome("failed");
                    summary.failed += 1;
                    tracing::warn!(
                        user_id = %owner,
                        keyword = %keyword,
                        error = %e,
                        "Failed to send DM"
                    );
                },
            }
        }
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("keyword_notifications_total", "outcome" => outcome).increment(1);
}

/// Notification channel that records deliveries in memory.
#[cfg(test)]
pub struct MockChannel {
    /// Users whose DMs are refused.
    pub refusing: std::collections::HashSet<UserId>,
    /// Users whose deliveries fail with a transport error.
    pub failing: std::collections::HashSet<UserId>,
    /// Delivered `(user, notification)` pairs in send order.
    pub sent: std::sync::Mutex<Vec<(UserId, Notification)>>,
}

#[cfg(test)]
impl MockChannel {
    /// Creates a channel that accepts everything.
    pub fn new() -> Self {
        Self {
            refusing: std::collections::HashSet::new(),
            failing: std::collections::HashSet::new(),
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Returns the users that received a notification, in send order.
    pub fn recipients(&self) -> Vec<UserId> {
        self.sent.lock().expect("lock").iter().map(|(u, _)| *u).collect()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl NotificationChannel for MockChannel {
    async fn send_direct(
        &self,
        recipient: &crate::platform::Recipient,
        notification: &Notification,
    ) -> crate::Result<DeliveryOutcome> {
        if self.refusing.contains(&recipient.user) {
            return Ok(DeliveryOutcome::Refused);
        }
        if self.failing.contains(&recipient.user) {
            return Err(crate::Error::OperationFailed {
                operation: "send_direct".to_string(),
                cause: "connection reset".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("lock")
            .push((recipient.user, notification.clone()));
        Ok(DeliveryOutcome::Delivered)
    }
}
