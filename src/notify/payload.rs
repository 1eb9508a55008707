//! Direct-message payload.

use crate::models::IncomingMessage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header line of every keyword notification.
pub const NOTIFICATION_HEADER: &str = "키워드가 감지되었습니다";

/// A keyword notification for one recipient.
///
/// One notification is built per matched keyword. The rendered body does not
/// name the keyword, so a recipient matching two keywords receives two
/// identical messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The keyword that triggered this notification.
    pub keyword: String,
    /// Channel name without the leading `#`.
    pub channel_name: String,
    /// Permalink to the source message.
    pub jump_url: String,
    /// Display name of the message author.
    pub author_name: String,
    /// Message text, verbatim.
    pub content: String,
}

impl Notification {
    /// Builds the notification for `keyword` matched in `message`.
    #[must_use]
    pub fn for_match(message: &IncomingMessage, keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            channel_name: message.channel_name.clone(),
            jump_url: message.permalink(),
            author_name: message.author_name.clone(),
            content: message.content.clone(),
        }
    }

    /// Renders the text sent to the recipient.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{NOTIFICATION_HEADER}\n\n채널: #{} ({})\n유저: {}\n메시지: {}",
            self.channel_name, self.jump_url, self.author_name, self.content
        )
    }
}
