//! Data models for keyword-notifier.
//!
//! This module contains the identifiers, subscription records and message
//! descriptors shared by the matcher, the dispatcher and the store.

mod ids;
mod message;
mod subscription;

pub use ids::{ChannelId, MessageId, ServerId, UserId};
pub use message::{
    DEBUG_PREVIEW_CHARS, IncomingMessage, LOG_PREVIEW_CHARS, preview_text,
};
pub use subscription::{GLOBAL_SCOPE_KEY, Scope, Subscription};
