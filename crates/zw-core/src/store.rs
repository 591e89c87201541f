//! Flag storage.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ZwError, ZwResult};
use crate::value::FlagValue;

/// An ordered mapping of flag keys to values.
pub type FlagMap = BTreeMap<String, FlagValue>;

/// A key-value store for flags.
///
/// Keys are effective keys, already resolved by [`crate::scope::resolve`].
/// Methods take `&self` so a store can be shared between the runner and
/// the rest of the host through an `Arc`.
pub trait FlagStore: Send + Sync {
    /// Fetch a flag value.
    fn get(&self, key: &str) -> Option<FlagValue>;

    /// Write a flag value, replacing any previous one.
    fn set(&self, key: &str, value: FlagValue);

    /// Remove a flag. Returns whether it was present.
    fn delete(&self, key: &str) -> bool;

    /// A copy of every flag in the store.
    fn all(&self) -> FlagMap;

    /// Add `amount` to a numeric flag and return the new value.
    ///
    /// An absent flag counts as zero.
    fn increment(&self, key: &str, amount: &FlagValue) -> ZwResult<FlagValue> {
        let next = add(key, self.get(key), amount, false)?;
        self.set(key, next.clone());
        Ok(next)
    }

    /// Subtract `amount` from a numeric flag and return the new value.
    ///
    /// An absent flag counts as zero. The result is not clamped.
    fn decrement(&self, key: &str, amount: &FlagValue) -> ZwResult<FlagValue> {
        let next = add(key, self.get(key), amount, true)?;
        self.set(key, next.clone());
        Ok(next)
    }

    /// Remove every flag.
    fn clear(&self) {
        for key in self.all().into_keys() {
            self.delete(&key);
        }
    }

    /// Clear the store, then repopulate it from `flags`.
    fn replace(&self, flags: FlagMap) {
        self.clear();
        for (key, value) in flags {
            self.set(&key, value);
        }
    }
}

fn add(
    key: &str,
    current: Option<FlagValue>,
    amount: &FlagValue,
    negate: bool,
) -> ZwResult<FlagValue> {
    let current = current.unwrap_or(FlagValue::Integer(0));
    if !amount.is_number() {
        return Err(ZwError::InvalidAmount {
            key: key.to_string(),
            amount: amount.clone(),
        });
    }
    match (&current, amount) {
        (FlagValue::Integer(a), FlagValue::Integer(b)) => {
            let result = if negate { a.checked_sub(*b) } else { a.checked_add(*b) };
            result
                .map(FlagValue::Integer)
                .ok_or_else(|| ZwError::Overflow(key.to_string()))
        }
        _ => {
            let a = current.as_f64().ok_or_else(|| ZwError::NotNumeric {
                key: key.to_string(),
                value: current.clone(),
            })?;
            let b = amount.as_f64().unwrap_or_default();
            Ok(FlagValue::Float(if negate { a - b } else { a + b }))
        }
    }
}

/// In-memory [`FlagStore`].
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: RwLock<FlagMap>,
}

impl MemoryFlagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `flags`.
    pub fn with_flags(flags: FlagMap) -> Self {
        Self {
            flags: RwLock::new(flags),
        }
    }

    /// Number of flags in the store.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, FlagMap> {
        self.flags.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FlagMap> {
        self.flags.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Option<FlagValue> {
        self.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: FlagValue) {
        self.write().insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    fn all(&self) -> FlagMap {
        self.read().clone()
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn replace(&self, flags: FlagMap) {
        *self.write() = flags;
    }
}
