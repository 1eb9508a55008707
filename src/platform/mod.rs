//! Chat platform seams.
//!
//! The watcher only talks to the platform through the traits in this
//! module. [`StaticDirectory`] implements all of them from a TOML file and
//! backs the `replay` command; [`CachedIdentityResolver`] puts an LRU cache
//! in front of any identity resolver.

mod cache;
mod directory;
mod traits;

pub use cache::{CachedIdentityResolver, DEFAULT_IDENTITY_CACHE_CAPACITY};
pub use directory::{SentNotification, StaticDirectory};
pub use traits::{
    ChannelCatalog, ChannelInfo, DeliveryOutcome, IdentityResolver, Member, MemberDirectory,
    NotificationChannel, PermissionOracle, Recipient,
};
