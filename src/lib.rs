//! # Keyword Notifier
//!
//! Watches chat server messages and privately notifies users whose
//! registered keywords appear in them.
//!
//! ## Features
//!
//! - Case-insensitive whole-word matching for Latin and other scripts
//! - Particle-tolerant matching for Korean keywords (`사과` matches `사과는`)
//! - Server-wide or per-channel subscriptions with a per-server limit
//! - Permission-aware delivery: nobody hears about channels they cannot see
//! - `SQLite` subscription store and a static TOML platform for replays
//!
//! ## Example
//!
//! ```rust,ignore
//! use keyword_notifier::services::{KeywordWatcher, SubscriptionIndex};
//!
//! let watcher = KeywordWatcher::new(SubscriptionIndex::new(store), dispatcher);
//! let report = watcher.handle_message(&message).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod matching;
pub mod models;
pub mod notify;
pub mod observability;
pub mod platform;
pub mod services;
pub mod storage;

pub use config::AppConfig;
pub use matching::{KeywordPattern, MatchEngine, MatchMode, MatchResult};
pub use models::{ChannelId, IncomingMessage, MessageId, Scope, ServerId, Subscription, UserId};
pub use notify::{DispatchSummary, Notification, NotificationDispatcher};
pub use services::{KeywordWatcher, MessageReport, SubscribeOutcome, SubscriptionService};
pub use storage::{SqliteSubscriptionBackend, SubscriptionBackend};

/// Error type for keyword notifier operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty keyword, channel from another server, malformed directory file |
/// | `OperationFailed` | Database, filesystem or platform calls fail |
/// | `Unauthorized` | Requester cannot view the channel; platform lookup forbidden |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The caller lacks permission.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

impl Error {
    /// Returns the text to show an end user.
    ///
    /// Input and permission errors carry a ready-made sentence; operational
    /// failures fall back to the full error text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::Unauthorized(msg) => msg.clone(),
            Self::OperationFailed { .. } => self.to_string(),
        }
    }
}

/// Result type alias for keyword notifier operations.
pub type Result<T> = std::result::Result<T, Error>;
