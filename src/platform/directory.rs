//! Platform adapter backed by a static TOML description.
//!
//! Describes users, servers, channels and memberships up front so the
//! watcher can run without a live chat connection:
//!
//! ```toml
//! [[users]]
//! id = 2
//! name = "alice"
//! dms_disabled = false
//!
//! [[servers]]
//! id = 10
//! name = "example"
//! members = [1, 2]
//!
//! [[servers.channels]]
//! id = 100
//! name = "general"
//!
//! [[servers.channels]]
//! id = 101
//! name = "staff"
//! viewers = [2]      # omitted: every member can view
//! ```
//!
//! Deliveries land in an in-memory outbox.

use super::traits::{
    ChannelCatalog, ChannelInfo, DeliveryOutcome, IdentityResolver, Member, MemberDirectory,
    NotificationChannel, PermissionOracle, Recipient,
};
use crate::models::{ChannelId, ServerId, UserId};
use crate::notify::Notification;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    users: Vec<UserEntry>,
    #[serde(default)]
    servers: Vec<ServerEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    id: UserId,
    name: String,
    #[serde(default)]
    dms_disabled: bool,
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    id: ServerId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    members: Vec<UserId>,
    #[serde(default)]
    channels: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    id: ChannelId,
    name: String,
    viewers: Option<Vec<UserId>>,
}

#[derive(Debug)]
struct ChannelRecord {
    info: ChannelInfo,
    viewers: Option<HashSet<UserId>>,
}

/// A notification accepted by the static adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    /// Who received it.
    pub recipient: Recipient,
    /// What was sent.
    pub notification: Notification,
}

/// In-memory platform described by a TOML file.
#[derive(Debug)]
pub struct StaticDirectory {
    users: HashMap<UserId, UserEntry>,
    servers: HashMap<ServerId, HashSet<UserId>>,
    server_names: HashMap<ServerId, String>,
    channels: HashMap<ChannelId, ChannelRecord>,
    outbox: Mutex<Vec<SentNotification>>,
}

impl StaticDirectory {
    /// Loads a directory from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_directory".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a directory from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the TOML is malformed.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: DirectoryFile = toml::from_str(contents)
            .map_err(|e| Error::InvalidInput(format!("invalid directory file: {e}")))?;

        let users = file.users.into_iter().map(|u| (u.id, u)).collect();
        let mut servers = HashMap::new();
        let mut server_names = HashMap::new();
        let mut channels = HashMap::new();

        for server in file.servers {
            for channel in server.channels {
                channels.insert(
                    channel.id,
                    ChannelRecord {
                        info: ChannelInfo {
                            id: channel.id,
                            server: server.id,
                            name: channel.name,
                        },
                        viewers: channel.viewers.map(|v| v.into_iter().collect()),
                    },
                );
            }
            server_names.insert(server.id, server.name);
            servers.insert(server.id, server.members.into_iter().collect());
        }

        Ok(Self {
            users,
            servers,
            server_names,
            channels,
            outbox: Mutex::new(Vec::new()),
        })
    }

    /// Returns the configured name of `server`.
    #[must_use]
    pub fn server_name(&self, server: ServerId) -> Option<&str> {
        self.server_names.get(&server).map(String::as_str)
    }

    /// Returns a copy of everything delivered so far.
    pub fn outbox(&self) -> Vec<SentNotification> {
        self.lock_outbox().clone()
    }

    /// Removes and returns everything delivered so far.
    pub fn drain_outbox(&self) -> Vec<SentNotification> {
        std::mem::take(&mut *self.lock_outbox())
    }

    fn lock_outbox(&self) -> MutexGuard<'_, Vec<SentNotification>> {
        match self.outbox.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Outbox mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        }
    }
}

#[async_trait]
impl MemberDirectory for StaticDirectory {
    async fn resolve_member(&self, server: ServerId, user: UserId) -> Result<Option<Member>> {
        let is_member = self
            .servers
            .get(&server)
            .is_some_and(|members| members.contains(&user));
        if !is_member {
            return Ok(None);
        }
        let display_name = self
            .users
            .get(&user)
            .map_or_else(|| user.to_string(), |u| u.name.clone());
        Ok(Some(Member {
            user,
            server,
            display_name,
        }))
    }
}

impl PermissionOracle for StaticDirectory {
    fn can_view(&self, member: &Member, channel: ChannelId) -> bool {
        let Some(record) = self.channels.get(&channel) else {
            return false;
        };
        if record.info.server != member.server {
            return false;
        }
        record
            .viewers
            .as_ref()
            .is_none_or(|viewers| viewers.contains(&member.user))
    }
}

#[async_trait]
impl IdentityResolver for StaticDirectory {
    async fn resolve_identity(&self, user: UserId) -> Result<Option<Recipient>> {
        Ok(self.users.get(&user).map(|u| Recipient {
            user,
            name: u.name.clone(),
        }))
    }
}

#[async_trait]
impl NotificationChannel for StaticDirectory {
    async fn send_direct(
        &self,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<DeliveryOutcome> {
        if self.users.get(&recipient.user).is_some_and(|u| u.dms_disabled) {
            return Ok(DeliveryOutcome::Refused);
        }
        tracing::debug!(
            user_id = %recipient.user,
            keyword = %notification.keyword,
            "Queued notification in outbox"
        );
        self.lock_outbox().push(SentNotification {
            recipient: recipient.clone(),
            notification: notification.clone(),
        });
        Ok(DeliveryOutcome::Delivered)
    }
}

impl ChannelCatalog for StaticDirectory {
    fn channel(&self, channel: ChannelId) -> Option<ChannelInfo> {
        self.channels.get(&channel).map(|c| c.info.clone())
    }
}
