//! The backing-store capability.
//!
//! The settings registry sits on top of an untyped key-value store consumed
//! through the [`SettingsStore`] trait. Persistent engines (files, system
//! preferences, databases) implement it however they like; the registry only
//! relies on the operations declared here. [`MemoryStore`] is the in-memory
//! reference implementation used by tests.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use crate::value::SettingsValue;

/// Which configuration layer a stored value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The local (user) layer.
    Local,
    /// The global (system) layer.
    Global,
    /// Either layer, or unknown. This is also what [`SettingsStore::origin_of`]
    /// reports for absent keys.
    Any,
}

/// Capability trait for the untyped key-value store backing a registry.
///
/// Implementations must be internally synchronized (`&self` methods) and
/// `Send + Sync`; the registry performs no locking of its own.
///
/// # Layer precedence
///
/// Stores with multiple layers must resolve [`value`](Self::value) with the
/// local layer overriding the global one, so that the registry's
/// enumeration and selection logic can treat a key as single-valued.
pub trait SettingsStore: Send + Sync {
    /// Return the stored value at `key`, if any.
    fn value(&self, key: &str) -> Option<SettingsValue>;

    /// Store `value` at `key`, returning whether the write occurred.
    fn set_value(&self, key: &str, value: SettingsValue) -> bool;

    /// Remove the value at `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str);

    /// Whether a value is stored at `key`.
    fn contains(&self, key: &str) -> bool;

    /// The layer the value at `key` came from, or [`Origin::Any`] if the key
    /// is absent.
    fn origin_of(&self, key: &str) -> Origin;

    /// All stored keys starting with `prefix`, in sorted order.
    ///
    /// Used by the registry to enumerate named-list items.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// A two-layer in-memory store.
///
/// Writes through [`SettingsStore::set_value`] go to the local layer; the
/// global layer is seeded through [`set_value_in`](Self::set_value_in)
/// (typically by tests or by an application loading system-wide defaults).
/// Reads resolve local over global.
#[derive(Default)]
pub struct MemoryStore {
    local: RwLock<BTreeMap<String, SettingsValue>>,
    global: RwLock<BTreeMap<String, SettingsValue>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `key` in the given layer.
    ///
    /// [`Origin::Any`] routes to the local layer.
    pub fn set_value_in(&self, origin: Origin, key: &str, value: SettingsValue) -> bool {
        let layer = match origin {
            Origin::Global => &self.global,
            Origin::Local | Origin::Any => &self.local,
        };
        layer.write().insert(key.to_string(), value);
        tracing::trace!(target: "trellis_store::memory", key, ?origin, "stored value");
        true
    }

    /// Remove the value at `key` from the given layer.
    ///
    /// [`Origin::Any`] removes from both layers.
    pub fn remove_in(&self, origin: Origin, key: &str) {
        match origin {
            Origin::Local => {
                self.local.write().remove(key);
            }
            Origin::Global => {
                self.global.write().remove(key);
            }
            Origin::Any => {
                self.local.write().remove(key);
                self.global.write().remove(key);
            }
        }
        tracing::trace!(target: "trellis_store::memory", key, ?origin, "removed value");
    }

    fn collect_prefixed(
        map: &BTreeMap<String, SettingsValue>,
        prefix: &str,
        out: &mut BTreeSet<String>,
    ) {
        for (key, _) in map
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            out.insert(key.clone());
        }
    }
}

impl SettingsStore for MemoryStore {
    fn value(&self, key: &str) -> Option<SettingsValue> {
        // Local overrides global.
        if let Some(value) = self.local.read().get(key) {
            return Some(value.clone());
        }
        self.global.read().get(key).cloned()
    }

    fn set_value(&self, key: &str, value: SettingsValue) -> bool {
        self.set_value_in(Origin::Local, key, value)
    }

    fn remove(&self, key: &str) {
        self.remove_in(Origin::Any, key);
    }

    fn contains(&self, key: &str) -> bool {
        self.local.read().contains_key(key) || self.global.read().contains_key(key)
    }

    fn origin_of(&self, key: &str) -> Origin {
        if self.local.read().contains_key(key) {
            Origin::Local
        } else if self.global.read().contains_key(key) {
            Origin::Global
        } else {
            Origin::Any
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys = BTreeSet::new();
        Self::collect_prefixed(&self.local.read(), prefix, &mut keys);
        Self::collect_prefixed(&self.global.read(), prefix, &mut keys);
        keys.into_iter().collect()
    }
}
