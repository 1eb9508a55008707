//! `replay`: feed recorded messages through the watcher.
//!
//! Messages are read from a JSON Lines file, one [`IncomingMessage`] per
//! line. Blank lines and lines starting with `#` are skipped. The static
//! directory stands in for the chat platform, and notifications it accepts
//! are printed instead of sent.

use std::path::Path;
use std::sync::Arc;

use crate::models::IncomingMessage;
use crate::notify::NotificationDispatcher;
use crate::platform::{
    CachedIdentityResolver, IdentityResolver, MemberDirectory, NotificationChannel,
    PermissionOracle, StaticDirectory,
};
use crate::services::{KeywordWatcher, MessageReport, SubscriptionIndex};
use crate::storage::SubscriptionBackend;
use crate::{Error, Result};

/// Totals for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayTotals {
    /// Messages read from the file.
    pub messages: usize,
    /// Messages dropped by intake filters.
    pub ignored: usize,
    /// Notifications delivered.
    pub delivered: usize,
    /// Notifications refused by recipients.
    pub refused: usize,
}

/// Parses a JSON Lines message file.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the first line that is not a valid
/// message.
pub fn parse_messages(contents: &str) -> Result<Vec<IncomingMessage>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::InvalidInput(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}

/// Handles `replay`.
///
/// # Returns
///
/// The printable transcript: each delivered notification followed by a
/// totals line.
///
/// # Errors
///
/// Returns an error if the message file cannot be read or parsed, or the
/// subscription store fails.
pub async fn cmd_replay(
    store: Arc<dyn SubscriptionBackend>,
    directory: Arc<StaticDirectory>,
    messages_path: &Path,
    identity_cache_capacity: usize,
) -> Result<String> {
    let contents =
        std::fs::read_to_string(messages_path).map_err(|e| Error::OperationFailed {
            operation: "read_messages".to_string(),
            cause: format!("{}: {e}", messages_path.display()),
        })?;
    let messages = parse_messages(&contents)?;

    let identities = CachedIdentityResolver::new(
        Arc::clone(&directory) as Arc<dyn IdentityResolver>,
        identity_cache_capacity,
    );
    let dispatcher = NotificationDispatcher::new(
        Arc::clone(&directory) as Arc<dyn MemberDirectory>,
        Arc::clone(&directory) as Arc<dyn PermissionOracle>,
        Arc::new(identities),
        Arc::clone(&directory) as Arc<dyn NotificationChannel>,
    );
    let watcher = KeywordWatcher::new(SubscriptionIndex::new(store), Arc::new(dispatcher));

    let mut transcript = String::new();
    let mut totals = ReplayTotals::default();

    for message in &messages {
        totals.messages += 1;
        match watcher.handle_message(message).await? {
            MessageReport::Ignored(_) => totals.ignored += 1,
            MessageReport::Dispatched { summary, .. } => {
                totals.delivered += summary.delivered;
                totals.refused += summary.refused;
            },
            MessageReport::NoSubscriptions | MessageReport::NoMatches { .. } => {},
        }

        let server = message.server_id.map_or_else(String::new, |id| {
            directory
                .server_name(id)
                .filter(|name| !name.is_empty())
                .map_or_else(|| id.to_string(), str::to_string)
        });
        for sent in directory.drain_outbox() {
            transcript.push_str(&format!(
                "--- to {} ({}) [{}] in {server}\n{}\n",
                sent.recipient.name,
                sent.recipient.user,
                sent.notification.keyword,
                sent.notification.render()
            ));
        }
    }

    transcript.push_str(&format!(
        "Replayed {} messages ({} ignored): {} notifications sent, {} refused.",
        totals.messages, totals.ignored, totals.delivered, totals.refused
    ));
    Ok(transcript)
}
