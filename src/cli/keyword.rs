//! Subscription commands: add, list and remove keywords.
//!
//! Every command returns the reply a user would see. Validation problems
//! (empty keyword, foreign channel, missing access) are replies too; only
//! storage and file errors come back as `Err`.

use crate::models::{ChannelId, ServerId, UserId};
use crate::platform::{ChannelCatalog, MemberDirectory, StaticDirectory};
use crate::services::{SubscribeOutcome, SubscriptionService, render_listing};
use crate::{Error, Result};

/// Handles `add-channel`.
///
/// # Errors
///
/// Returns an error if storage cannot be accessed.
pub async fn cmd_add_channel(
    service: &SubscriptionService,
    directory: &StaticDirectory,
    user: UserId,
    server: ServerId,
    channel: ChannelId,
    keyword: &str,
) -> Result<String> {
    let Some(info) = directory.channel(channel) else {
        return Ok("Please choose a channel from this server.".to_string());
    };
    let Some(requester) = directory.resolve_member(server, user).await? else {
        return Ok("You do not have access to that channel.".to_string());
    };

    let outcome = match service.subscribe_channel(&requester, server, &info, directory, keyword) {
        Ok(outcome) => outcome,
        Err(e) => return user_facing(e),
    };

    let keyword = keyword.trim();
    let target = format!("#{}", info.name);
    Ok(match outcome {
        SubscribeOutcome::Added => format!("Added keyword `{keyword}` for {target}."),
        SubscribeOutcome::AlreadyTracked => {
            format!("Keyword `{keyword}` is already tracked for {target}.")
        },
        SubscribeOutcome::LimitReached { limit } => limit_reply(limit),
    })
}

/// Handles `add-server`.
///
/// # Errors
///
/// Returns an error if storage cannot be accessed.
pub fn cmd_add_server(
    service: &SubscriptionService,
    user: UserId,
    server: ServerId,
    keyword: &str,
) -> Result<String> {
    let outcome = match service.subscribe_server(user, server, keyword) {
        Ok(outcome) => outcome,
        Err(e) => return user_facing(e),
    };

    let keyword = keyword.trim();
    Ok(match outcome {
        SubscribeOutcome::Added => {
            format!("Added keyword `{keyword}` for all accessible channels in this server.")
        },
        SubscribeOutcome::AlreadyTracked => {
            format!("Keyword `{keyword}` is already tracked server-wide.")
        },
        SubscribeOutcome::LimitReached { limit } => limit_reply(limit),
    })
}

/// Handles `list`.
///
/// Channel names come from `catalog`; without one every channel renders as
/// unknown.
///
/// # Errors
///
/// Returns an error if storage cannot be accessed.
pub fn cmd_list(
    service: &SubscriptionService,
    catalog: Option<&dyn ChannelCatalog>,
    user: UserId,
    server: ServerId,
) -> Result<String> {
    let entries = service.list(user, server)?;
    let rendered = match catalog {
        Some(catalog) => render_listing(&entries, server, catalog),
        None => render_listing(&entries, server, &NoChannels),
    };
    Ok(rendered.unwrap_or_else(|| "You have no keywords tracked in this server.".to_string()))
}

/// Handles `remove`.
///
/// # Errors
///
/// Returns an error if storage cannot be accessed.
pub fn cmd_remove(
    service: &SubscriptionService,
    user: UserId,
    server: ServerId,
    keyword: &str,
) -> Result<String> {
    let removed = match service.unsubscribe(user, server, keyword) {
        Ok(removed) => removed,
        Err(e) => return user_facing(e),
    };

    let keyword = keyword.trim();
    Ok(if removed > 0 {
        format!("Removed `{keyword}` from this server ({removed} entries).")
    } else {
        format!("No tracked keyword `{keyword}` found in this server.")
    })
}

fn limit_reply(limit: usize) -> String {
    format!(
        "Keyword limit reached (max {limit} per server). Remove one before adding a new keyword."
    )
}

/// Turns validation errors into replies and passes everything else on.
fn user_facing(error: Error) -> Result<String> {
    match error {
        Error::InvalidInput(_) | Error::Unauthorized(_) => Ok(error.user_message()),
        Error::OperationFailed { .. } => Err(error),
    }
}

struct NoChannels;

impl ChannelCatalog for NoChannels {
    fn channel(&self, _channel: ChannelId) -> Option<crate::platform::ChannelInfo> {
        None
    }
}
