//! Keyword subscription management.
//!
//! Business rules on top of a [`SubscriptionBackend`]:
//!
//! | Rule | Result |
//! |------|--------|
//! | Channel from another server | [`Error::InvalidInput`] |
//! | Requester cannot view the channel | [`Error::Unauthorized`] |
//! | Keyword empty after trimming | [`Error::InvalidInput`] |
//! | Keyword already tracked for the scope | [`SubscribeOutcome::AlreadyTracked`] |
//! | Requester at the per-server limit | [`SubscribeOutcome::LimitReached`] |
//!
//! The already-tracked check runs before the limit check, so re-adding an
//! existing keyword at the limit reports it as tracked, not as a limit hit.

use std::sync::Arc;

use crate::models::{Scope, ServerId, Subscription, UserId};
use crate::platform::{ChannelCatalog, ChannelInfo, Member, PermissionOracle};
use crate::storage::SubscriptionBackend;
use crate::{Error, Result};

/// Default number of subscriptions a user may hold per server.
pub const DEFAULT_MAX_KEYWORDS_PER_SERVER: usize = 10;

/// Result of a subscribe request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A new subscription was stored.
    Added,
    /// The keyword was already tracked for this scope.
    AlreadyTracked,
    /// The requester holds the maximum number of subscriptions.
    LimitReached {
        /// The limit in force.
        limit: usize,
    },
}

/// Service for subscription operations.
pub struct SubscriptionService {
    backend: Arc<dyn SubscriptionBackend>,
    max_per_server: usize,
}

impl SubscriptionService {
    /// Creates a service with the default per-server limit.
    #[must_use]
    pub fn new(backend: Arc<dyn SubscriptionBackend>) -> Self {
        Self {
            backend,
            max_per_server: DEFAULT_MAX_KEYWORDS_PER_SERVER,
        }
    }

    /// Overrides the per-server subscription limit.
    #[must_use]
    pub const fn with_limit(mut self, max_per_server: usize) -> Self {
        self.max_per_server = max_per_server;
        self
    }

    /// Subscribes `requester` to `keyword` in a single channel.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the channel is not in `server` or the
    ///   keyword is empty
    /// - [`Error::Unauthorized`] if the requester cannot view the channel
    /// - [`Error::OperationFailed`] if storage cannot be accessed
    pub fn subscribe_channel(
        &self,
        requester: &Member,
        server: ServerId,
        channel: &ChannelInfo,
        permissions: &dyn PermissionOracle,
        keyword: &str,
    ) -> Result<SubscribeOutcome> {
        if channel.server != server {
            return Err(Error::InvalidInput(
                "Please choose a channel from this server.".to_string(),
            ));
        }
        if !permissions.can_view(requester, channel.id) {
            return Err(Error::Unauthorized(
                "You do not have access to that channel.".to_string(),
            ));
        }

        let outcome = self.subscribe(
            requester.user,
            server,
            keyword,
            Scope::Channel(channel.id),
        )?;
        tracing::info!(
            user_id = %requester.user,
            guild_id = %server,
            channel_id = %channel.id,
            keyword = %keyword.trim(),
            outcome = ?outcome,
            "Channel keyword request handled"
        );
        Ok(outcome)
    }

    /// Subscribes `requester` to `keyword` across the whole server.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the keyword is empty
    /// - [`Error::OperationFailed`] if storage cannot be accessed
    pub fn subscribe_server(
        &self,
        requester: UserId,
        server: ServerId,
        keyword: &str,
    ) -> Result<SubscribeOutcome> {
        let outcome = self.subscribe(requester, server, keyword, Scope::Global)?;
        tracing::info!(
            user_id = %requester,
            guild_id = %server,
            keyword = %keyword.trim(),
            outcome = ?outcome,
            "Server keyword request handled"
        );
        Ok(outcome)
    }

    fn subscribe(
        &self,
        requester: UserId,
        server: ServerId,
        keyword: &str,
        scope: Scope,
    ) -> Result<SubscribeOutcome> {
        let keyword = normalize_keyword(keyword)?;

        if self.backend.exists(server, requester, keyword, scope)? {
            return Ok(SubscribeOutcome::AlreadyTracked);
        }
        if self.backend.count_for_user(server, requester)? >= self.max_per_server {
            return Ok(SubscribeOutcome::LimitReached {
                limit: self.max_per_server,
            });
        }

        let added = self
            .backend
            .add(server, &Subscription::new(requester, keyword, scope))?;
        if added {
            metrics::counter!("keyword_subscriptions_added_total").increment(1);
            Ok(SubscribeOutcome::Added)
        } else {
            Ok(SubscribeOutcome::AlreadyTracked)
        }
    }

    /// Lists `requester`'s subscriptions in `server`, ordered by keyword
    /// then scope.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    pub fn list(&self, requester: UserId, server: ServerId) -> Result<Vec<Subscription>> {
        let entries = self.backend.list_for_user(server, requester)?;
        tracing::info!(
            user_id = %requester,
            guild_id = %server,
            count = entries.len(),
            "Listed keywords"
        );
        Ok(entries)
    }

    /// Removes every scope of `keyword` for `requester` in `server`.
    ///
    /// # Returns
    ///
    /// The number of subscriptions removed; zero when none matched.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the keyword is empty
    /// - [`Error::OperationFailed`] if storage cannot be accessed
    pub fn unsubscribe(&self, requester: UserId, server: ServerId, keyword: &str) -> Result<usize> {
        let keyword = normalize_keyword(keyword)?;
        let removed = self.backend.remove(server, requester, keyword)?;
        tracing::info!(
            user_id = %requester,
            guild_id = %server,
            keyword = %keyword,
            removed,
            "Remove keyword request handled"
        );
        Ok(removed)
    }
}

/// Formats a subscription listing.
///
/// Returns `None` for an empty listing. Channels that `catalog` does not
/// know, or that belong to another server, render as
/// `#unknown-channel (<id>)`.
#[must_use]
pub fn render_listing(
    entries: &[Subscription],
    server: ServerId,
    catalog: &dyn ChannelCatalog,
) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let location = match entry.scope {
                Scope::Global => entry.scope.storage_key(),
                Scope::Channel(id) => catalog
                    .channel(id)
                    .filter(|c| c.server == server)
                    .map_or_else(|| format!("#unknown-channel ({id})"), |c| format!("#{}", c.name)),
            };
            format!("`{}` → {location}", entry.keyword)
        })
        .collect();

    Some(format!("Your keywords:\n{}", lines.join("\n")))
}

fn normalize_keyword(keyword: &str) -> Result<&str> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(Error::InvalidInput("Keyword cannot be empty.".to_string()));
    }
    Ok(keyword)
}
