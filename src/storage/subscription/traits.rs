//! Subscription storage trait.

use crate::Result;
use crate::models::{Scope, ServerId, Subscription, UserId};

/// Persistent store of keyword subscriptions.
///
/// Keywords compare case-insensitively: `Sale` and `sale` are the same
/// subscription. Implementations must be thread-safe (`Send + Sync`).
pub trait SubscriptionBackend: Send + Sync {
    /// Stores a subscription.
    ///
    /// # Returns
    ///
    /// `true` if a new row was written, `false` if an equal subscription
    /// already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn add(&self, server: ServerId, subscription: &Subscription) -> Result<bool>;

    /// Returns `true` if `owner` already tracks `keyword` under `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn exists(&self, server: ServerId, owner: UserId, keyword: &str, scope: Scope) -> Result<bool>;

    /// Number of subscriptions `owner` holds in `server`, across all scopes.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn count_for_user(&self, server: ServerId, owner: UserId) -> Result<usize>;

    /// Lists `owner`'s subscriptions in `server`, ordered by keyword then
    /// scope key.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn list_for_user(&self, server: ServerId, owner: UserId) -> Result<Vec<Subscription>>;

    /// Removes every scope of `keyword` for `owner` in `server`.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn remove(&self, server: ServerId, owner: UserId, keyword: &str) -> Result<usize>;

    /// Lists every subscription registered in `server`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn list_for_server(&self, server: ServerId) -> Result<Vec<Subscription>>;
}
