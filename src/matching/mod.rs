//! Keyword matching.
//!
//! - **Particles** (`particles.rs`): the Korean particle table and Hangul detection
//! - **Pattern** (`pattern.rs`): keyword text → compiled matcher
//! - **Engine** (`engine.rs`): one message × subscriptions → [`MatchResult`]

mod engine;
mod particles;
mod pattern;

pub use engine::{MatchContext, MatchEngine, MatchResult, PatternCache};
pub use particles::{
    KOREAN_PARTICLES, MAX_STACKED_PARTICLES, is_hangul_syllable, particles_longest_first,
};
pub use pattern::{KeywordPattern, MatchMode};
