//! Business logic services.
//!
//! - [`SubscriptionService`]: add, list and remove keyword subscriptions
//! - [`SubscriptionIndex`]: per-message snapshot of a server's subscriptions
//! - [`KeywordWatcher`]: runs each incoming message through matching and
//!   notification

mod index;
mod subscription;
mod watcher;

pub use index::SubscriptionIndex;
pub use subscription::{
    DEFAULT_MAX_KEYWORDS_PER_SERVER, SubscribeOutcome, SubscriptionService, render_listing,
};
pub use watcher::{IgnoreReason, KeywordWatcher, MessageReport};
