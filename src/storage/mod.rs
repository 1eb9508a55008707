//! Storage layer.
//!
//! Subscriptions live behind [`SubscriptionBackend`]; the only shipped
//! implementation is [`SqliteSubscriptionBackend`]. Connection helpers are
//! shared through [`connection`].

// Dropping the connection guard a statement earlier buys nothing here.
#![allow(clippy::significant_drop_tightening)]

pub mod connection;
pub mod subscription;

pub use subscription::{SqliteSubscriptionBackend, SubscriptionBackend};
