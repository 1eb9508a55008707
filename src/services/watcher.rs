//! Message watcher: the entry point for every observed chat message.
//!
//! # Pipeline
//!
//! ```text
//! IncomingMessage
//!   -> intake filters (no server, bot author, empty text)
//!   -> SubscriptionIndex::snapshot        (empty: stop)
//!   -> MatchEngine::evaluate              (no matches: stop)
//!   -> NotificationDispatcher::dispatch
//! ```
//!
//! The watcher holds no per-message state. Handling the same message twice
//! evaluates it twice and may notify twice.

use std::sync::Arc;

use super::index::SubscriptionIndex;
use crate::Result;
use crate::matching::{MatchContext, MatchEngine};
use crate::models::{DEBUG_PREVIEW_CHARS, IncomingMessage, LOG_PREVIEW_CHARS};
use crate::notify::{DispatchSummary, NotificationDispatcher};

/// Why a message was dropped before any store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The message was not posted in a server.
    NoServer,
    /// The author is an automated account.
    BotAuthor,
    /// The message has no text.
    EmptyContent,
}

/// What [`KeywordWatcher::handle_message`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageReport {
    /// Dropped by an intake filter.
    Ignored(IgnoreReason),
    /// The server has no subscriptions.
    NoSubscriptions,
    /// Subscriptions exist but none matched.
    NoMatches {
        /// Subscriptions evaluated.
        subscriptions: usize,
    },
    /// At least one subscriber matched; notifications were attempted.
    Dispatched {
        /// Matched `(owner, keyword)` pairs.
        matches: usize,
        /// Delivery results.
        summary: DispatchSummary,
    },
}

/// Watches messages and notifies keyword subscribers.
pub struct KeywordWatcher {
    index: SubscriptionIndex,
    engine: MatchEngine,
    dispatcher: Arc<NotificationDispatcher>,
}

impl KeywordWatcher {
    /// Creates a watcher.
    #[must_use]
    pub fn new(index: SubscriptionIndex, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            index,
            engine: MatchEngine::new(),
            dispatcher,
        }
    }

    /// Processes one message end to end.
    ///
    /// # Errors
    ///
    /// Returns an error only if the subscription store cannot be read.
    /// Lookup and delivery problems are logged and reported in the
    /// [`DispatchSummary`] instead.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<MessageReport> {
        let Some(server) = message.server_id else {
            return Ok(MessageReport::Ignored(IgnoreReason::NoServer));
        };
        if message.author_is_bot {
            return Ok(MessageReport::Ignored(IgnoreReason::BotAuthor));
        }
        if message.content.is_empty() {
            return Ok(MessageReport::Ignored(IgnoreReason::EmptyContent));
        }

        metrics::counter!("keyword_messages_total").increment(1);
        tracing::info!(
            guild_id = %server,
            channel_id = %message.channel_id,
            author_id = %message.author_id,
            content = %message.preview(LOG_PREVIEW_CHARS),
            "Message seen"
        );
        tracing::debug!(
            author = %message.author_name,
            content = %message.preview(DEBUG_PREVIEW_CHARS),
            "Processing message"
        );

        let subscriptions = self.index.snapshot(server).await?;
        if subscriptions.is_empty() {
            tracing::info!(guild_id = %server, "No keywords for guild");
            return Ok(MessageReport::NoSubscriptions);
        }

        let ctx = MatchContext {
            author: message.author_id,
            channel: message.channel_id,
            text: &message.content,
        };
        let matches = self.engine.evaluate(&ctx, &subscriptions);
        if matches.is_empty() {
            tracing::info!(
                guild_id = %server,
                channel_id = %message.channel_id,
                "No keyword matches"
            );
            return Ok(MessageReport::NoMatches {
                subscriptions: subscriptions.len(),
            });
        }

        let matched = matches.keyword_count();
        metrics::counter!("keyword_matches_total").increment(matched as u64);

        let summary = self.dispatcher.dispatch(message, server, &matches).await;
        Ok(MessageReport::Dispatched {
            matches: matched,
            summary,
        })
    }
}
