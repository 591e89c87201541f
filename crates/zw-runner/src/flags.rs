//! Access to both flag stores through raw flag names.

use zw_core::{FlagRef, FlagScope, FlagStore, FlagValue, resolve};

/// The persistent and ephemeral stores, addressed by raw flag name.
#[derive(Clone, Copy)]
pub struct FlagScopes<'a> {
    /// Host-owned store.
    pub persistent: &'a dyn FlagStore,
    /// Per-session store.
    pub ephemeral: &'a dyn FlagStore,
}

impl<'a> FlagScopes<'a> {
    /// Bundle two stores.
    pub fn new(persistent: &'a dyn FlagStore, ephemeral: &'a dyn FlagStore) -> Self {
        Self {
            persistent,
            ephemeral,
        }
    }

    /// The store a resolved flag lives in.
    pub fn store(&self, flag: &FlagRef) -> &'a dyn FlagStore {
        match flag.scope {
            FlagScope::Persistent => self.persistent,
            FlagScope::Ephemeral => self.ephemeral,
        }
    }

    /// Read a flag by raw name.
    pub fn get(&self, raw: &str) -> Option<FlagValue> {
        let flag = resolve(raw);
        self.store(&flag).get(&flag.key)
    }
}
