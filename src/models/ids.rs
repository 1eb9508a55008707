//! Platform identifiers.
//!
//! Chat platforms hand out 64-bit snowflake identifiers for users, servers,
//! channels and messages. Each kind gets its own newtype so a channel id can
//! never be passed where a user id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw snowflake value.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw snowflake value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a platform user (subscriber or message author).
    UserId
);

snowflake_id!(
    /// Identifier of a server (guild).
    ServerId
);

snowflake_id!(
    /// Identifier of a text channel within a server.
    ChannelId
);

snowflake_id!(
    /// Identifier of a single chat message.
    MessageId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: ChannelId = " 1234567890123 ".parse().expect("parse");
        assert_eq!(id.get(), 1_234_567_890_123);
        assert_eq!(id.to_string(), "1234567890123");
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("GLOBAL".parse::<ChannelId>().is_err());
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&UserId::new(42)).expect("serialize");
        assert_eq!(json, "42");
        let back: UserId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, UserId::new(42));
    }
}
