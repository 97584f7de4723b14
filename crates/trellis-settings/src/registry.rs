//! The settings registry.
//!
//! A [`SettingsRegistry`] owns a [`SettingsTree`] and a backing
//! [`SettingsStore`]. Tree mutation (registering nodes and entries) needs
//! `&mut self`; value access needs `&self` only, since the store is
//! internally synchronized. Applications typically build the tree once at
//! startup and then share the registry for reads and writes.
//!
//! Value access flows through [`SettingsEntry`] handles: resolve the entry's
//! key template with the caller's dynamic parts, then read or write the
//! backing store. Reads never fail on bad stored data; an absent,
//! incompatible, or check-failing stored value falls back to the entry
//! default. Structural problems (stale handles, arity mismatches, malformed
//! dynamic parts) surface as [`SettingsError`].

use std::collections::BTreeSet;
use std::sync::Arc;

use trellis_store::{Origin, SettingsStore, SettingsValue};

use crate::entry::{EntryDef, SettingsEntry, SettingsType};
use crate::error::{Result, SettingsError};
use crate::logging::targets;
use crate::tree::{
    EntryId, KEY_SEPARATOR, NamedListOptions, NodeId, NodeKind, SettingsTree,
    key_matches_template, substitute_parts, substitute_parts_lenient, validate_dynamic_part,
};

/// Suffix appended to a resolved key to store the previous value.
const FORMER_VALUE_SUFFIX: &str = "_formervalue";

fn former_value_key(key: &str) -> String {
    format!("{key}{FORMER_VALUE_SUFFIX}")
}

/// A typed, hierarchical settings registry over an untyped key-value store.
///
/// See the [crate documentation](crate) for an overview and example.
pub struct SettingsRegistry {
    tree: SettingsTree,
    store: Arc<dyn SettingsStore>,
}

impl SettingsRegistry {
    /// Create a registry over the given backing store.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            tree: SettingsTree::new(),
            store,
        }
    }

    /// The root node of the registry's tree.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// The settings tree, for introspection and debug formatting.
    pub fn tree(&self) -> &SettingsTree {
        &self.tree
    }

    /// The backing store.
    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    // ------------------------------------------------------------------
    // Tree building
    // ------------------------------------------------------------------

    /// Get or create a standard child node.
    ///
    /// Returns the existing node when one with the same key and kind is
    /// already present.
    pub fn create_child_node(&mut self, parent: NodeId, key: &str) -> Result<NodeId> {
        self.tree.create_child_node(parent, key)
    }

    /// Get or create a named list child node.
    ///
    /// Returns the existing node when one with the same key and kind is
    /// already present; differing options are logged and ignored.
    pub fn create_named_list_node(
        &mut self,
        parent: NodeId,
        key: &str,
        options: NamedListOptions,
    ) -> Result<NodeId> {
        self.tree.create_named_list_node(parent, key, options)
    }

    /// Register a typed entry under a node.
    pub fn register_entry<T: SettingsType>(
        &mut self,
        parent: NodeId,
        def: EntryDef<T>,
    ) -> Result<SettingsEntry<T>> {
        let (key, default, description, options, check) = def.into_parts();
        let id = self.tree.register_entry(
            parent,
            &key,
            T::KIND,
            default.clone().into_value(),
            description,
            options,
        )?;
        Ok(SettingsEntry::new(id, default, check))
    }

    /// Register a typed entry that is not attached to a tree node.
    ///
    /// The definition key is the full key template, placeholders included
    /// (e.g. `"plugins/%1/enabled"`). Detached entries resolve and validate
    /// like attached ones but do not appear in tree traversal.
    pub fn register_detached_entry<T: SettingsType>(
        &mut self,
        def: EntryDef<T>,
    ) -> Result<SettingsEntry<T>> {
        let (key, default, description, options, check) = def.into_parts();
        let id = self.tree.register_detached_entry(
            &key,
            T::KIND,
            default.clone().into_value(),
            description,
            options,
        )?;
        Ok(SettingsEntry::new(id, default, check))
    }

    #[cfg(test)]
    pub(crate) fn register_raw_entry(
        &mut self,
        parent: NodeId,
        key: &str,
        kind: trellis_store::SettingsKind,
        default: SettingsValue,
        description: String,
        options: crate::tree::EntryOptions,
    ) -> Result<EntryId> {
        self.tree
            .register_entry(parent, key, kind, default, description, options)
    }

    /// Unregister an entry.
    ///
    /// With `delete_values`, every stored key matching the entry's key
    /// template is removed first, former-value copies included. For dynamic
    /// entries this enumerates all instantiated combinations.
    pub fn unregister_entry(&mut self, id: EntryId, delete_values: bool) -> Result<()> {
        if delete_values {
            self.delete_entry_values(id)?;
        }
        self.tree.unregister_entry(id)
    }

    /// Unregister a node and its whole subtree.
    ///
    /// With `delete_values`, the stored values of every entry in the subtree
    /// are removed first, selected-item companions included.
    pub fn unregister_node(&mut self, id: NodeId, delete_values: bool) -> Result<()> {
        // Reject bad ids before touching the store, so a failed
        // unregistration never deletes values.
        if id == self.tree.root() {
            return Err(SettingsError::CannotRemoveRoot);
        }
        if !self.tree.contains_node(id) {
            return Err(SettingsError::UnknownNode);
        }
        if delete_values {
            let mut entries = Vec::new();
            self.collect_subtree_entries(id, &mut entries)?;
            for entry in entries {
                self.delete_entry_values(entry)?;
            }
        }
        self.tree.unregister_node(id)
    }

    // ------------------------------------------------------------------
    // Named lists
    // ------------------------------------------------------------------

    /// The names of the items stored in a named list, sorted.
    ///
    /// `parent_parts` resolves the placeholders of *outer* named lists; for
    /// a top-level list it is empty.
    pub fn items(&self, list: NodeId, parent_parts: &[&str]) -> Result<Vec<String>> {
        self.items_with_origin(list, Origin::Any, parent_parts)
    }

    /// Like [`items`](Self::items), restricted to values stored in one
    /// configuration layer. [`Origin::Any`] applies no filter.
    pub fn items_with_origin(
        &self,
        list: NodeId,
        origin: Origin,
        parent_parts: &[&str],
    ) -> Result<Vec<String>> {
        let prefix = self.items_prefix(list, parent_parts)?;
        let mut names = BTreeSet::new();
        for key in self.store.keys_with_prefix(&prefix) {
            if origin != Origin::Any && self.store.origin_of(&key) != origin {
                continue;
            }
            if let Some(item) = key[prefix.len()..].split(KEY_SEPARATOR).next() {
                if !item.is_empty() {
                    names.insert(item.to_string());
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Remove every stored value of one named-list item.
    pub fn delete_item(&self, list: NodeId, item: &str, parent_parts: &[&str]) -> Result<()> {
        validate_dynamic_part(item)?;
        let prefix = format!("{}{item}{KEY_SEPARATOR}", self.items_prefix(list, parent_parts)?);
        self.remove_prefixed(&prefix);
        tracing::debug!(target: targets::REGISTRY, item, prefix = %prefix, "deleted named list item");
        Ok(())
    }

    /// Remove every stored value of every item of a named list.
    pub fn delete_all_items(&self, list: NodeId, parent_parts: &[&str]) -> Result<()> {
        let prefix = self.items_prefix(list, parent_parts)?;
        self.remove_prefixed(&prefix);
        tracing::debug!(target: targets::REGISTRY, prefix = %prefix, "deleted all named list items");
        Ok(())
    }

    /// The currently selected item of a named list, or the empty string when
    /// none has been selected.
    ///
    /// Fails with [`SettingsError::SelectedItemNotEnabled`] when the list was
    /// created without [`NamedListOptions::selected_item`].
    pub fn selected_item(&self, list: NodeId, parent_parts: &[&str]) -> Result<String> {
        let entry = self.selected_entry(list)?;
        let key = self.resolve_entry_key(entry, parent_parts)?;
        Ok(self
            .store
            .value(&key)
            .and_then(|value| value.as_string())
            .unwrap_or_default())
    }

    /// Persist which item of a named list is the current one.
    pub fn set_selected_item(
        &self,
        list: NodeId,
        item: &str,
        parent_parts: &[&str],
    ) -> Result<bool> {
        validate_dynamic_part(item)?;
        let entry = self.selected_entry(list)?;
        let key = self.resolve_entry_key(entry, parent_parts)?;
        Ok(self.store.set_value(&key, SettingsValue::from(item)))
    }

    // ------------------------------------------------------------------
    // Untyped access
    // ------------------------------------------------------------------

    /// Read the stored value of an entry without typed conversion.
    ///
    /// Intended for introspection tooling; application code should go
    /// through [`SettingsEntry`].
    pub fn raw_value(&self, id: EntryId, parts: &[&str]) -> Result<Option<SettingsValue>> {
        let key = self.resolve_entry_key(id, parts)?;
        Ok(self.store.value(&key))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn resolve_entry_key(&self, id: EntryId, parts: &[&str]) -> Result<String> {
        let expected = self.tree.entry_dynamic_parts(id)?;
        let template = self.tree.entry_definition_key(id)?;
        substitute_parts(template, expected, parts)
    }

    /// Resolved `…/items/` prefix of a named list, trailing separator
    /// included.
    fn items_prefix(&self, list: NodeId, parent_parts: &[&str]) -> Result<String> {
        // Checks the node is a named list, so the count below is at least 1.
        let template = self.tree.items_complete_key(list)?;
        let expected = self.tree.named_nodes_count(list)? - 1;
        let resolved = substitute_parts(template, expected, parent_parts)?;
        Ok(format!("{resolved}{KEY_SEPARATOR}"))
    }

    fn selected_entry(&self, list: NodeId) -> Result<EntryId> {
        self.tree.selected_item_entry(list)?.ok_or_else(|| {
            SettingsError::SelectedItemNotEnabled {
                key: self
                    .tree
                    .node_key(list)
                    .map(str::to_string)
                    .unwrap_or_default(),
            }
        })
    }

    fn remove_prefixed(&self, prefix: &str) {
        for key in self.store.keys_with_prefix(prefix) {
            self.store.remove(&key);
        }
    }

    /// Remove every stored key matching an entry's key template, former
    /// values included.
    fn delete_entry_values(&self, id: EntryId) -> Result<()> {
        let template = self.tree.entry_definition_key(id)?.to_string();
        let former_template = former_value_key(&template);
        let static_prefix = &template[..template.find('%').unwrap_or(template.len())];
        for key in self.store.keys_with_prefix(static_prefix) {
            if key_matches_template(&template, &key)
                || key_matches_template(&former_template, &key)
            {
                self.store.remove(&key);
            }
        }
        tracing::debug!(target: targets::REGISTRY, template = %template, "deleted stored values");
        Ok(())
    }

    fn collect_subtree_entries(&self, id: NodeId, out: &mut Vec<EntryId>) -> Result<()> {
        out.extend_from_slice(self.tree.children_settings(id)?);
        if self.tree.node_kind(id)? == NodeKind::NamedList {
            if let Some(selected) = self.tree.selected_item_entry(id)? {
                out.push(selected);
            }
        }
        for child in self.tree.children_nodes(id)?.to_vec() {
            self.collect_subtree_entries(child, out)?;
        }
        Ok(())
    }

    fn typed_value<T: SettingsType>(&self, entry: &SettingsEntry<T>, parts: &[&str]) -> Result<T> {
        let key = self.resolve_entry_key(entry.id(), parts)?;
        Ok(self.read_or(entry, &key, entry.default_value().clone()))
    }

    fn read_with_fallback<T: SettingsType>(&self, entry: &SettingsEntry<T>, key: &str) -> T {
        self.read_or(entry, key, entry.default_value().clone())
    }

    fn read_or<T: SettingsType>(&self, entry: &SettingsEntry<T>, key: &str, fallback: T) -> T {
        match self.store.value(key) {
            None => fallback,
            Some(raw) => match T::from_value(&raw) {
                Some(value) if entry.accepts(&value) => value,
                Some(_) => {
                    tracing::debug!(
                        target: targets::REGISTRY,
                        key,
                        "stored value fails the entry check, using default"
                    );
                    fallback
                }
                None => {
                    tracing::warn!(
                        target: targets::REGISTRY,
                        key,
                        kind = %raw.kind(),
                        "stored value has an incompatible kind, using default"
                    );
                    fallback
                }
            },
        }
    }

    fn typed_set<T: SettingsType>(
        &self,
        entry: &SettingsEntry<T>,
        value: T,
        parts: &[&str],
    ) -> Result<bool> {
        let key = self.resolve_entry_key(entry.id(), parts)?;
        if !entry.accepts(&value) {
            tracing::debug!(target: targets::REGISTRY, key = %key, "value rejected by the entry check");
            return Ok(false);
        }
        let stored = value.into_value();
        let options = self.tree.entry_options(entry.id())?;
        if options.save_former_value {
            if let Some(previous) = self.store.value(&key) {
                if previous != stored {
                    self.store.set_value(&former_value_key(&key), previous);
                }
            }
        }
        tracing::trace!(target: targets::REGISTRY, key = %key, "set value");
        Ok(self.store.set_value(&key, stored))
    }

    fn typed_former<T: SettingsType>(
        &self,
        entry: &SettingsEntry<T>,
        parts: &[&str],
    ) -> Result<T> {
        let key = self.resolve_entry_key(entry.id(), parts)?;
        let options = self.tree.entry_options(entry.id())?;
        if options.save_former_value {
            let former = former_value_key(&key);
            if self.store.contains(&former) {
                return Ok(self.read_with_fallback(entry, &former));
            }
        } else {
            tracing::warn!(
                target: targets::REGISTRY,
                key = %key,
                "former value requested but the entry does not save it"
            );
        }
        // No former value recorded: behave like a plain read.
        Ok(self.read_with_fallback(entry, &key))
    }

    fn typed_copy_from<T: SettingsType>(
        &self,
        entry: &SettingsEntry<T>,
        source_template: &str,
        parts: &[&str],
        remove_source: bool,
    ) -> Result<bool> {
        let destination = self.resolve_entry_key(entry.id(), parts)?;
        let source = substitute_parts_lenient(source_template, parts);
        let Some(value) = self.store.value(&source) else {
            return Ok(false);
        };
        tracing::debug!(
            target: targets::REGISTRY,
            from = %source,
            to = %destination,
            "migrating stored value"
        );
        let written = self.store.set_value(&destination, value);
        if written && remove_source {
            self.store.remove(&source);
        }
        Ok(written)
    }

    fn typed_copy_to<T: SettingsType>(
        &self,
        entry: &SettingsEntry<T>,
        target_template: &str,
        parts: &[&str],
    ) -> Result<bool> {
        let source = self.resolve_entry_key(entry.id(), parts)?;
        let target = substitute_parts_lenient(target_template, parts);
        match self.store.value(&source) {
            Some(value) => Ok(self.store.set_value(&target, value)),
            None => Ok(false),
        }
    }
}

/// Value access, resolved against a registry.
///
/// The `*_for` variants supply dynamic key parts; the plain variants are for
/// entries without dynamic keys and pass no parts.
impl<T: SettingsType> SettingsEntry<T> {
    /// Read the value, falling back to the default when absent or unusable.
    pub fn value(&self, registry: &SettingsRegistry) -> Result<T> {
        self.value_for(registry, &[])
    }

    /// Read the value of one dynamic instance.
    pub fn value_for(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<T> {
        registry.typed_value(self, parts)
    }

    /// Read the value, falling back to `default` instead of the entry
    /// default.
    pub fn value_or(&self, registry: &SettingsRegistry, default: T) -> Result<T> {
        self.value_or_for(registry, default, &[])
    }

    /// Read the value of one dynamic instance with an overridden default.
    pub fn value_or_for(
        &self,
        registry: &SettingsRegistry,
        default: T,
        parts: &[&str],
    ) -> Result<T> {
        let key = registry.resolve_entry_key(self.id(), parts)?;
        Ok(registry.read_or(self, &key, default))
    }

    /// Write the value. Returns `Ok(false)` when the entry check rejects it
    /// or the store refuses the write.
    pub fn set_value(&self, registry: &SettingsRegistry, value: T) -> Result<bool> {
        self.set_value_for(registry, value, &[])
    }

    /// Write the value of one dynamic instance.
    pub fn set_value_for(
        &self,
        registry: &SettingsRegistry,
        value: T,
        parts: &[&str],
    ) -> Result<bool> {
        registry.typed_set(self, value, parts)
    }

    /// Whether a value is stored (as opposed to reads serving the default).
    pub fn exists(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<bool> {
        let key = registry.resolve_entry_key(self.id(), parts)?;
        Ok(registry.store.contains(&key))
    }

    /// Remove the stored value, so later reads serve the default.
    pub fn remove_value(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<()> {
        let key = registry.resolve_entry_key(self.id(), parts)?;
        registry.store.remove(&key);
        Ok(())
    }

    /// The configuration layer the stored value came from, or
    /// [`Origin::Any`] when no value is stored.
    pub fn origin(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<Origin> {
        let key = registry.resolve_entry_key(self.id(), parts)?;
        Ok(registry.store.origin_of(&key))
    }

    /// The key template of this entry, placeholders included.
    pub fn definition_key(&self, registry: &SettingsRegistry) -> Result<String> {
        Ok(registry.tree.entry_definition_key(self.id())?.to_string())
    }

    /// Whether part of this entry's key is built dynamically.
    pub fn has_dynamic_key(&self, registry: &SettingsRegistry) -> Result<bool> {
        registry.tree.entry_has_dynamic_key(self.id())
    }

    /// The concrete storage key for the given dynamic parts.
    pub fn key_for(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<String> {
        registry.resolve_entry_key(self.id(), parts)
    }

    /// Whether a concrete storage key is an instance of this entry's key
    /// template.
    pub fn key_matches(&self, registry: &SettingsRegistry, key: &str) -> Result<bool> {
        let template = registry.tree.entry_definition_key(self.id())?;
        Ok(key_matches_template(template, key))
    }

    /// Read the value this entry held before its last change.
    ///
    /// When no former value has been recorded yet this behaves exactly like
    /// [`value_for`](Self::value_for). Only meaningful for entries built
    /// with [`EntryDef::save_former_value`]; calling it on other entries
    /// logs a warning and reads the current value.
    pub fn former_value(&self, registry: &SettingsRegistry, parts: &[&str]) -> Result<T> {
        registry.typed_former(self, parts)
    }

    /// Migrate a value stored under a legacy key into this entry.
    ///
    /// `source_template` may carry `%N` placeholders, resolved from `parts`
    /// without arity checking. Returns whether a value was copied; with
    /// `remove_source` the legacy key is removed after a successful copy.
    pub fn copy_value_from_key(
        &self,
        registry: &SettingsRegistry,
        source_template: &str,
        parts: &[&str],
        remove_source: bool,
    ) -> Result<bool> {
        registry.typed_copy_from(self, source_template, parts, remove_source)
    }

    /// Copy this entry's stored value to another key.
    ///
    /// Returns `Ok(false)` when no value is stored.
    pub fn copy_value_to_key(
        &self,
        registry: &SettingsRegistry,
        target_template: &str,
        parts: &[&str],
    ) -> Result<bool> {
        registry.typed_copy_to(self, target_template, parts)
    }
}

static_assertions::assert_impl_all!(SettingsRegistry: Send, Sync);
static_assertions::assert_impl_all!(SettingsEntry<i64>: Send, Sync, Clone);
