//! Keyword subscription storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteSubscriptionBackend;
pub use traits::SubscriptionBackend;
