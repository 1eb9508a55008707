//! Per-message subscription snapshots.

use std::sync::Arc;

use crate::models::{ServerId, Subscription};
use crate::storage::SubscriptionBackend;
use crate::{Error, Result};

/// Read-only view of the subscription store used by the watcher.
///
/// Every call reads the store afresh; nothing is cached between messages,
/// so a subscription added a moment ago applies to the next message.
#[derive(Clone)]
pub struct SubscriptionIndex {
    backend: Arc<dyn SubscriptionBackend>,
}

impl SubscriptionIndex {
    /// Creates an index over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn SubscriptionBackend>) -> Self {
        Self { backend }
    }

    /// Returns every subscription registered in `server`.
    ///
    /// The store is queried on the blocking pool so a slow disk does not
    /// stall other message tasks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the store cannot be read or the
    /// blocking task is cancelled.
    pub async fn snapshot(&self, server: ServerId) -> Result<Vec<Subscription>> {
        let backend = Arc::clone(&self.backend);
        tokio::task::spawn_blocking(move || backend.list_for_server(server))
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "subscription_snapshot".to_string(),
                cause: e.to_string(),
            })?
    }
}
