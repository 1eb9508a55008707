//! LRU cache in front of an identity resolver.
//!
//! Mirrors the platform client's user cache: a hit is answered locally, a
//! miss goes to the wrapped resolver. Only positive lookups are cached so a
//! user who was unreachable once is looked up again on the next message.

use super::traits::{IdentityResolver, Recipient};
use crate::Result;
use crate::models::UserId;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of cached recipients.
pub const DEFAULT_IDENTITY_CACHE_CAPACITY: usize = 1024;

/// Identity resolver with a bounded local cache.
///
/// The cache is shared by every message task holding this resolver. It only
/// stores recipients, never per-message state.
pub struct CachedIdentityResolver {
    inner: Arc<dyn IdentityResolver>,
    cache: Mutex<LruCache<UserId, Recipient>>,
}

impl CachedIdentityResolver {
    /// Wraps `inner` with a cache of `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(inner: Arc<dyn IdentityResolver>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached recipients.
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<UserId, Recipient>> {
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Identity cache mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        }
    }
}

#[async_trait]
impl IdentityResolver for CachedIdentityResolver {
    async fn resolve_identity(&self, user: UserId) -> Result<Option<Recipient>> {
        if let Some(hit) = self.lock().get(&user).cloned() {
            metrics::counter!("identity_cache_hits_total").increment(1);
            return Ok(Some(hit));
        }
        metrics::counter!("identity_cache_misses_total").increment(1);

        let fetched = self.inner.resolve_identity(user).await?;
        if let Some(recipient) = &fetched {
            self.lock().put(user, recipient.clone());
        }
        Ok(fetched)
    }
}
