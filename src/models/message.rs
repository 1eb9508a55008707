//! Incoming chat message descriptor.
//!
//! This is the read-only view of a platform message that the watcher
//! consumes. Platform adapters fill it in; replay files deserialize straight
//! into it.

use super::ids::{ChannelId, MessageId, ServerId, UserId};
use serde::{Deserialize, Serialize};

/// Preview length used for info-level message logs.
pub const LOG_PREVIEW_CHARS: usize = 200;

/// Preview length used for debug-level message logs.
pub const DEBUG_PREVIEW_CHARS: usize = 500;

/// A message observed in a server channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Author identifier.
    pub author_id: UserId,
    /// Author display name at the time the message was posted.
    pub author_name: String,
    /// Whether the author is an automated account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// Server the message was posted in; `None` for direct messages.
    #[serde(default)]
    pub server_id: Option<ServerId>,
    /// Channel the message was posted in.
    pub channel_id: ChannelId,
    /// Channel name without the leading `#`.
    pub channel_name: String,
    /// Permalink supplied by the platform, if any.
    #[serde(default)]
    pub jump_url: Option<String>,
    /// Raw message text.
    #[serde(default)]
    pub content: String,
}

impl IncomingMessage {
    /// Returns the permalink for this message.
    ///
    /// Falls back to the conventional `channels/{server}/{channel}/{message}`
    /// link when the platform did not supply one.
    #[must_use]
    pub fn permalink(&self) -> String {
        if let Some(url) = self.jump_url.as_deref().filter(|u| !u.is_empty()) {
            return url.to_string();
        }
        let server = self
            .server_id
            .map_or_else(|| "@me".to_string(), |id| id.to_string());
        format!(
            "https://discord.com/channels/{server}/{}/{}",
            self.channel_id, self.id
        )
    }

    /// Returns the message text shortened for logging.
    #[must_use]
    pub fn preview(&self, limit: usize) -> String {
        preview_text(&self.content, limit)
    }
}

/// Shortens `text` to at most `limit` characters, ending in `...` when cut.
#[must_use]
pub fn preview_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
