//! Flag scope resolution.
//!
//! A raw flag name is mapped to a store and an effective key:
//!
//! | raw name      | scope        | key           |
//! |---------------|--------------|---------------|
//! | `conv:mood`   | `Ephemeral`  | `mood`        |
//! | `game:gold`   | `Persistent` | `gold`        |
//! | `gold`        | `Persistent` | `gold`        |
//! | `quest:stage` | `Persistent` | `quest:stage` |
//!
//! Recognized prefixes are stripped; an unrecognized name is kept whole.
//! Every read and write path goes through [`resolve`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix selecting the per-conversation store.
pub const CONVERSATION_PREFIX: &str = "conv:";
/// Prefix selecting the host-owned store.
pub const GAME_PREFIX: &str = "game:";

/// Which store a flag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagScope {
    /// Outlives the dialogue session; owned by the host.
    Persistent,
    /// Scoped to the current dialogue session.
    Ephemeral,
}

/// A resolved flag: its scope plus the key used in that scope's store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagRef {
    /// The store the flag lives in.
    pub scope: FlagScope,
    /// The effective key inside that store.
    pub key: String,
}

impl FlagRef {
    /// Resolve a raw flag name. Same as [`resolve`].
    pub fn parse(raw: &str) -> Self {
        resolve(raw)
    }
}

impl fmt::Display for FlagRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            FlagScope::Persistent => write!(f, "{GAME_PREFIX}{}", self.key),
            FlagScope::Ephemeral => write!(f, "{CONVERSATION_PREFIX}{}", self.key),
        }
    }
}

/// Map a raw flag name to its scope and effective key.
pub fn resolve(raw: &str) -> FlagRef {
    if let Some(key) = raw.strip_prefix(CONVERSATION_PREFIX) {
        FlagRef {
            scope: FlagScope::Ephemeral,
            key: key.to_string(),
        }
    } else if let Some(key) = raw.strip_prefix(GAME_PREFIX) {
        FlagRef {
            scope: FlagScope::Persistent,
            key: key.to_string(),
        }
    } else {
        FlagRef {
            scope: FlagScope::Persistent,
            key: raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn conversation_prefix_is_stripped() {
        let r = resolve("conv:mood");
        assert_eq!(r.scope, FlagScope::Ephemeral);
        assert_eq!(r.key, "mood");
    }

    #[test]
    fn game_prefix_is_stripped() {
        let r = resolve("game:gold");
        assert_eq!(r.scope, FlagScope::Persistent);
        assert_eq!(r.key, "gold");
    }

    #[test]
    fn unprefixed_name_is_kept_whole() {
        let r = resolve("quest:stage");
        assert_eq!(r.scope, FlagScope::Persistent);
        assert_eq!(r.key, "quest:stage");
    }

    #[test]
    fn game_and_bare_names_share_a_key() {
        assert_eq!(resolve("game:gold"), resolve("gold"));
    }

    #[test]
    fn only_the_leading_prefix_counts() {
        let r = resolve("conv:game:x");
        assert_eq!(r.scope, FlagScope::Ephemeral);
        assert_eq!(r.key, "game:x");
    }

    proptest! {
        #[test]
        fn display_round_trips(key in "[a-z_][a-z0-9_:]{0,12}") {
            for raw in [format!("conv:{key}"), format!("game:{key}")] {
                let r = resolve(&raw);
                prop_assert_eq!(r.to_string(), raw.clone());
                prop_assert_eq!(resolve(&r.to_string()), r);
            }
        }

        #[test]
        fn unprefixed_names_are_persistent_and_untouched(raw in "[a-fh-z][a-z0-9_:]{0,12}") {
            prop_assume!(!raw.starts_with("conv:"));
            let r = resolve(&raw);
            prop_assert_eq!(r.scope, FlagScope::Persistent);
            prop_assert_eq!(r.key, raw);
        }
    }
}
