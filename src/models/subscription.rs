//! Keyword subscription records.

use super::ids::{ChannelId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage key used for server-wide subscriptions.
pub const GLOBAL_SCOPE_KEY: &str = "GLOBAL";

/// Where a keyword subscription applies within its server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every channel in the server that the owner can view.
    Global,
    /// A single channel.
    Channel(ChannelId),
}

impl Scope {
    /// Returns the key persisted in the `channel_id` column.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Global => GLOBAL_SCOPE_KEY.to_string(),
            Self::Channel(id) => id.to_string(),
        }
    }

    /// Parses a persisted scope key.
    ///
    /// Returns `None` for keys that are neither `GLOBAL` nor a channel id.
    #[must_use]
    pub fn from_storage_key(key: &str) -> Option<Self> {
        if key == GLOBAL_SCOPE_KEY {
            return Some(Self::Global);
        }
        key.parse().ok().map(Self::Channel)
    }

    /// Returns `true` if a message posted in `channel` falls inside this scope.
    #[must_use]
    pub fn covers(&self, channel: ChannelId) -> bool {
        match self {
            Self::Global => true,
            Self::Channel(id) => *id == channel,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str(GLOBAL_SCOPE_KEY),
            Self::Channel(id) => write!(f, "channel:{id}"),
        }
    }
}

/// A user's request to be notified when `keyword` appears within `scope`.
///
/// Subscriptions always belong to exactly one server; the server id is the
/// key they are stored and queried under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    /// The subscriber.
    pub owner: UserId,
    /// Keyword text as registered (trimmed, original casing).
    pub keyword: String,
    /// Channel restriction.
    pub scope: Scope,
}

impl Subscription {
    /// Creates a new subscription record.
    #[must_use]
    pub fn new(owner: UserId, keyword: impl Into<String>, scope: Scope) -> Self {
        Self {
            owner,
            keyword: keyword.into(),
            scope,
        }
    }

    /// Creates a server-wide subscription.
    #[must_use]
    pub fn global(owner: UserId, keyword: impl Into<String>) -> Self {
        Self::new(owner, keyword, Scope::Global)
    }

    /// Creates a subscription restricted to one channel.
    #[must_use]
    pub fn in_channel(owner: UserId, keyword: impl Into<String>, channel: ChannelId) -> Self {
        Self::new(owner, keyword, Scope::Channel(channel))
    }
}
