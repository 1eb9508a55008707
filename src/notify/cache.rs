//! Per-dispatch memo of member and identity lookups.
//!
//! Created fresh for every message and dropped with it. Negative results are
//! memoized too: a user that could not be resolved once is not looked up
//! again within the same pass.

use crate::models::{ServerId, UserId};
use crate::platform::{IdentityResolver, Member, MemberDirectory, Recipient};
use std::collections::HashMap;

/// Resolution results for a single message pass.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    members: HashMap<UserId, Option<Member>>,
    identities: HashMap<UserId, Option<Recipient>>,
    lookups: usize,
}

impl ResolutionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the member record for `user`, querying `directory` at most
    /// once per user.
    ///
    /// Lookup errors are logged and memoized as absence.
    pub async fn member(
        &mut self,
        directory: &dyn MemberDirectory,
        server: ServerId,
        user: UserId,
    ) -> Option<Member> {
        if let Some(cached) = self.members.get(&user) {
            return cached.clone();
        }

        self.lookups += 1;
        let resolved = match directory.resolve_member(server, user).await {
            Ok(member) => member,
            Err(e) => {
                tracing::info!(
                    user_id = %user,
                    guild_id = %server,
                    error = %e,
                    "Member lookup failed"
                );
                None
            },
        };
        self.members.insert(user, resolved.clone());
        resolved
    }

    /// Returns a messageable handle for `user`, querying `resolver` at most
    /// once per user.
    ///
    /// Lookup errors are logged and memoized as absence.
    pub async fn identity(
        &mut self,
        resolver: &dyn IdentityResolver,
        user: UserId,
    ) -> Option<Recipient> {
        if let Some(cached) = self.identities.get(&user) {
            return cached.clone();
        }

        self.lookups += 1;
        let resolved = match resolver.resolve_identity(user).await {
            Ok(recipient) => recipient,
            Err(e) => {
                tracing::info!(user_id = %user, error = %e, "User lookup failed");
                None
            },
        };
        self.identities.insert(user, resolved.clone());
        resolved
    }

    /// Number of lookups that went to a collaborator.
    #[must_use]
    pub const fn lookups(&self) -> usize {
        self.lookups
    }
}
