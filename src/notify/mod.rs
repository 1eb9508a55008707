//! Keyword notifications.
//!
//! Turns a [`MatchResult`](crate::matching::MatchResult) into direct
//! messages. Resolution of members and identities is memoized per message
//! in a [`ResolutionCache`]; nothing is shared between messages.

mod cache;
mod dispatcher;
mod payload;

pub use cache::ResolutionCache;
#[cfg(test)]
pub use dispatcher::MockChannel;
pub use dispatcher::{DispatchSummary, NotificationDispatcher};
pub use payload::{NOTIFICATION_HEADER, Notification};
