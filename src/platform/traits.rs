//! Collaborator interfaces the watcher needs from the chat platform.
//!
//! Lookups that can hit the network are async; permission checks run on
//! data the platform already holds and stay synchronous. Implementations
//! must be thread-safe (`Send + Sync`) because one watcher serves many
//! concurrent message tasks.

use crate::Result;
use crate::models::{ChannelId, ServerId, UserId};
use crate::notify::Notification;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user's membership in a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The member's user id.
    pub user: UserId,
    /// The server the membership belongs to.
    pub server: ServerId,
    /// Server-specific display name.
    pub display_name: String,
}

/// A handle that can receive direct messages.
///
/// Distinct from [`Member`]: a user can be messaged without the bot holding
/// their server membership, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// The user behind this handle.
    pub user: UserId,
    /// Global user name.
    pub name: String,
}

/// Channel metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id.
    pub id: ChannelId,
    /// Owning server.
    pub server: ServerId,
    /// Channel name without the leading `#`.
    pub name: String,
}

/// Result of a single direct-message attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The platform accepted the message.
    Delivered,
    /// The recipient does not accept direct messages from the sender.
    Refused,
}

impl DeliveryOutcome {
    /// Returns the outcome as a metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Refused => "refused",
        }
    }
}

/// Resolves users to server members.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Looks up `user` in `server`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the user is not a member.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup is forbidden or the platform is
    /// unreachable. Callers treat errors the same as absence.
    async fn resolve_member(&self, server: ServerId, user: UserId) -> Result<Option<Member>>;
}

/// Answers channel visibility questions.
pub trait PermissionOracle: Send + Sync {
    /// Returns `true` if `member` may view `channel`.
    fn can_view(&self, member: &Member, channel: ChannelId) -> bool;
}

/// Resolves users to direct-message handles.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Looks up a messageable handle for `user`.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup is forbidden or the platform is
    /// unreachable. Callers treat errors the same as absence.
    async fn resolve_identity(&self, user: UserId) -> Result<Option<Recipient>>;
}

/// Sends direct messages.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers `notification` to `recipient`.
    ///
    /// # Returns
    ///
    /// [`DeliveryOutcome::Refused`] when the recipient has direct messages
    /// disabled for the sender.
    ///
    /// # Errors
    ///
    /// Returns an error for any other delivery failure.
    async fn send_direct(
        &self,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<DeliveryOutcome>;
}

/// Looks up channel metadata.
pub trait ChannelCatalog: Send + Sync {
    /// Returns metadata for `channel`, if known.
    fn channel(&self, channel: ChannelId) -> Option<ChannelInfo>;
}
