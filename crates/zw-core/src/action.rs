//! Side effects attached to nodes and choices.

use serde::{Deserialize, Serialize};

use crate::value::FlagValue;

fn default_amount() -> FlagValue {
    FlagValue::Integer(1)
}

/// A side-effecting command run when a node is entered or a choice is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Write a flag.
    Set {
        /// Raw flag name.
        flag: String,
        /// Value to write.
        value: FlagValue,
    },
    /// Remove a flag.
    Clear {
        /// Raw flag name.
        flag: String,
    },
    /// Add to a numeric flag.
    Increment {
        /// Raw flag name.
        flag: String,
        /// Amount to add. Defaults to 1.
        #[serde(default = "default_amount")]
        amount: FlagValue,
    },
    /// Subtract from a numeric flag. The result may go below zero.
    Decrement {
        /// Raw flag name.
        flag: String,
        /// Amount to subtract. Defaults to 1.
        #[serde(default = "default_amount")]
        amount: FlagValue,
    },
    /// Invoke a host-registered handler.
    Callback {
        /// Handler name.
        name: String,
        /// Arguments passed to the handler.
        #[serde(default)]
        args: Vec<FlagValue>,
    },
}

impl Action {
    /// Set `flag` to `value`.
    pub fn set(flag: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        Self::Set {
            flag: flag.into(),
            value: value.into(),
        }
    }

    /// Remove `flag`.
    pub fn clear(flag: impl Into<String>) -> Self {
        Self::Clear { flag: flag.into() }
    }

    /// Add 1 to `flag`.
    pub fn increment(flag: impl Into<String>) -> Self {
        Self::increment_by(flag, 1)
    }

    /// Add `amount` to `flag`.
    pub fn increment_by(flag: impl Into<String>, amount: impl Into<FlagValue>) -> Self {
        Self::Increment {
            flag: flag.into(),
            amount: amount.into(),
        }
    }

    /// Subtract 1 from `flag`.
    pub fn decrement(flag: impl Into<String>) -> Self {
        Self::decrement_by(flag, 1)
    }

    /// Subtract `amount` from `flag`.
    pub fn decrement_by(flag: impl Into<String>, amount: impl Into<FlagValue>) -> Self {
        Self::Decrement {
            flag: flag.into(),
            amount: amount.into(),
        }
    }

    /// Call the handler registered as `name`.
    pub fn callback(name: impl Into<String>, args: Vec<FlagValue>) -> Self {
        Self::Callback {
            name: name.into(),
            args,
        }
    }

    /// The wire name of this action's type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Clear { .. } => "clear",
            Self::Increment { .. } => "increment",
            Self::Decrement { .. } => "decrement",
            Self::Callback { .. } => "callback",
        }
    }

    /// The raw flag name this action touches, if any.
    pub fn flag(&self) -> Option<&str> {
        match self {
            Self::Set { flag, .. }
            | Self::Clear { flag }
            | Self::Increment { flag, .. }
            | Self::Decrement { flag, .. } => Some(flag),
            Self::Callback { .. } => None,
        }
    }
}
