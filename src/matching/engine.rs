//! Match engine: one message against a server's subscriptions.
//!
//! # Algorithm
//!
//! For each subscription, in order:
//!
//! 1. Skip it when the owner wrote the message (never self-notify).
//! 2. Skip it when it is scoped to another channel.
//! 3. Compile the keyword, at most once per distinct keyword per pass.
//! 4. Record the keyword under the owner when the pattern matches.
//!
//! The result is a set per owner, so the same keyword registered under
//! several scopes collapses to a single entry.

use super::pattern::KeywordPattern;
use crate::models::{ChannelId, Subscription, UserId};
use std::collections::{BTreeSet, HashMap, hash_map};

/// The parts of a message the engine looks at.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// Message author.
    pub author: UserId,
    /// Channel the message was posted in.
    pub channel: ChannelId,
    /// Raw message text.
    pub text: &'a str,
}

/// Compiled patterns keyed by keyword text, valid for one message pass.
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: HashMap<String, KeywordPattern>,
}

impl PatternCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pattern for `keyword`, compiling it on first use.
    pub fn get_or_compile(&mut self, keyword: &str) -> &KeywordPattern {
        match self.patterns.entry(keyword.to_string()) {
            hash_map::Entry::Occupied(entry) => entry.into_mut(),
            hash_map::Entry::Vacant(entry) => entry.insert(KeywordPattern::compile(keyword)),
        }
    }

    /// Number of distinct keywords compiled so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Matched keywords per subscriber for a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    matches: HashMap<UserId, BTreeSet<String>>,
}

impl MatchResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `keyword` matched for `owner`.
    pub fn insert(&mut self, owner: UserId, keyword: impl Into<String>) {
        self.matches.entry(owner).or_default().insert(keyword.into());
    }

    /// Returns `true` when no subscriber matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of subscribers with at least one match.
    #[must_use]
    pub fn owner_count(&self) -> usize {
        self.matches.len()
    }

    /// Total number of `(owner, keyword)` pairs.
    #[must_use]
    pub fn keyword_count(&self) -> usize {
        self.matches.values().map(BTreeSet::len).sum()
    }

    /// Keywords matched for `owner`, if any.
    #[must_use]
    pub fn keywords_for(&self, owner: UserId) -> Option<&BTreeSet<String>> {
        self.matches.get(&owner)
    }

    /// Iterates over `(owner, keywords)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &BTreeSet<String>)> {
        self.matches.iter().map(|(owner, keywords)| (*owner, keywords))
    }
}

/// Evaluates subscriptions against message text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchEngine;

impl MatchEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Matches one message against `subscriptions` with a fresh pattern cache.
    #[must_use]
    pub fn evaluate(&self, ctx: &MatchContext<'_>, subscriptions: &[Subscription]) -> MatchResult {
        let mut cache = PatternCache::new();
        self.evaluate_with_cache(ctx, subscriptions, &mut cache)
    }

    /// Matches one message, reusing `cache` for compiled patterns.
    ///
    /// The cache must not outlive the message pass it was created for.
    pub fn evaluate_with_cache(
        &self,
        ctx: &MatchContext<'_>,
        subscriptions: &[Subscription],
        cache: &mut PatternCache,
    ) -> MatchResult {
        let mut result = MatchResult::new();

        for sub in subscriptions {
            if sub.owner == ctx.author {
                tracing::info!(
                    user_id = %sub.owner,
                    keyword = %sub.keyword,
                    "Skip self match"
                );
                continue;
            }
            if !sub.scope.covers(ctx.channel) {
                continue;
            }

            if !cache.get_or_compile(&sub.keyword).is_match(ctx.text) {
                tracing::debug!(
                    keyword = %sub.keyword,
                    "Keyword registered but not matched in text"
                );
                continue;
            }

            result.insert(sub.owner, sub.keyword.as_str());
        }

        result
    }
}
