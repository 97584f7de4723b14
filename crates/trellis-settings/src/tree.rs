//! The settings tree.
//!
//! A [`SettingsTree`] organizes settings hierarchically for introspection
//! and tooling. Nodes are either the root, standard nodes, or *named lists*
//! (a dynamically keyed group of settings, one instance per named item).
//! Nodes and entry metadata live in arenas owned by the tree; handles are
//! stable [`NodeId`] / [`EntryId`] keys, so lifetimes are bound to the tree
//! rather than to raw references.
//!
//! Every node caches its *complete key* at creation time: the `/`-joined
//! path from the root, with one `%N` placeholder per named-list ancestor
//! (inclusive). A named list contributes `<key>/items/%N` to the complete
//! key, so the stored instances of its children live under
//! `…/<key>/items/<item>/…`.
//!
//! Structural invariants enforced here:
//!
//! - no two children (node or entry) share a local key at the same parent
//! - a node's named-nodes count equals its parent's, plus one for a named
//!   list
//! - local keys are non-empty and contain neither the separator nor
//!   placeholder characters
//!
//! Tree mutation happens through [`crate::SettingsRegistry`]; this module
//! exposes the read-only introspection surface.

use std::collections::BTreeSet;

use slotmap::{SlotMap, new_key_type};
use trellis_store::{SettingsKind, SettingsValue};

use crate::error::{Result, SettingsError};
use crate::logging::targets;

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '/';

new_key_type! {
    /// A stable handle to a node in a [`SettingsTree`].
    ///
    /// Handles remain valid as the tree grows and become invalid when the
    /// node is unregistered.
    pub struct NodeId;

    /// A stable handle to a settings entry registered in a [`SettingsTree`].
    pub struct EntryId;
}

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The root of a tree.
    Root,
    /// A normal grouping node.
    Standard,
    /// A dynamically keyed group of settings, one instance per named item.
    NamedList,
}

/// Options for named list nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NamedListOptions {
    /// Create a companion string setting that persists which named item is
    /// the current one. The companion is keyed by the *parent* dynamic
    /// parts: the selection is per parent context, not per item.
    pub selected_item: bool,
}

/// Options for settings entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryOptions {
    /// When the stored value changes, first copy the previous value to the
    /// former-value key so a later `former_value` read can recover it.
    pub save_former_value: bool,
}

/// Internal data stored for each tree node.
struct NodeData {
    kind: NodeKind,
    /// Local key segment (empty for the root).
    key: String,
    /// Cached complete key from the root, with `%N` placeholders.
    complete_key: String,
    /// Number of named-list nodes from the root to this node, inclusive.
    named_nodes_count: usize,
    parent: Option<NodeId>,
    /// Child nodes, in creation order.
    children: Vec<NodeId>,
    /// Entries registered directly at this node, in creation order.
    settings: Vec<EntryId>,
    /// Named-list only.
    options: NamedListOptions,
    /// Named-list only: key prefix under which item instances are stored.
    items_complete_key: String,
    /// Named-list only: the companion selected-item entry.
    selected_item_entry: Option<EntryId>,
}

/// Internal data stored for each settings entry.
struct EntryData {
    /// Local key segment.
    key: String,
    /// Complete key template, placeholders included.
    definition_key: String,
    /// Number of dynamic key parts required to resolve the key.
    dynamic_parts: usize,
    kind: SettingsKind,
    default: SettingsValue,
    description: String,
    options: EntryOptions,
    parent: Option<NodeId>,
}

/// A snapshot of one entry's metadata, for introspection tooling.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Local key segment.
    pub key: String,
    /// Complete key template, placeholders included.
    pub definition_key: String,
    /// Number of dynamic key parts required to resolve the key.
    pub dynamic_parts: usize,
    /// Declared value kind.
    pub kind: SettingsKind,
    /// Untyped default value.
    pub default: SettingsValue,
    /// Human-readable description.
    pub description: String,
    /// Entry options.
    pub options: EntryOptions,
    /// The node the entry is registered under, `None` for detached entries.
    pub parent: Option<NodeId>,
}

/// A rooted tree of settings nodes and entry metadata.
///
/// Obtained from [`crate::SettingsRegistry::tree`]. All accessors taking a
/// handle return [`SettingsError::UnknownNode`] /
/// [`SettingsError::UnknownEntry`] when the handle is stale; lookups by key
/// return `None` for absence, which is a normal outcome.
pub struct SettingsTree {
    nodes: SlotMap<NodeId, NodeData>,
    entries: SlotMap<EntryId, EntryData>,
    root: NodeId,
}

impl SettingsTree {
    pub(crate) fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData {
            kind: NodeKind::Root,
            key: String::new(),
            complete_key: String::new(),
            named_nodes_count: 0,
            parent: None,
            children: Vec::new(),
            settings: Vec::new(),
            options: NamedListOptions::default(),
            items_complete_key: String::new(),
            selected_item_entry: None,
        });
        Self {
            nodes,
            entries: SlotMap::with_key(),
            root,
        }
    }

    /// The root node of this tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` refers to a live node.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Whether `id` refers to a live entry.
    pub fn contains_entry(&self, id: EntryId) -> bool {
        self.entries.contains_key(id)
    }

    /// The kind of a node.
    pub fn node_kind(&self, id: NodeId) -> Result<NodeKind> {
        self.node(id).map(|node| node.kind)
    }

    /// The local key of a node (empty for the root).
    pub fn node_key(&self, id: NodeId) -> Result<&str> {
        self.node(id).map(|node| node.key.as_str())
    }

    /// The complete key of a node, placeholders included.
    pub fn node_complete_key(&self, id: NodeId) -> Result<&str> {
        self.node(id).map(|node| node.complete_key.as_str())
    }

    /// The number of named-list nodes from the root to this node, inclusive.
    ///
    /// This equals the number of dynamic key parts a descendant entry must
    /// supply.
    pub fn named_nodes_count(&self, id: NodeId) -> Result<usize> {
        self.node(id).map(|node| node.named_nodes_count)
    }

    /// The parent of a node, or `None` for the root.
    pub fn node_parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.node(id).map(|node| node.parent)
    }

    /// The child nodes of a node, in creation order.
    pub fn children_nodes(&self, id: NodeId) -> Result<&[NodeId]> {
        self.node(id).map(|node| node.children.as_slice())
    }

    /// The entries registered directly at a node, in creation order.
    pub fn children_settings(&self, id: NodeId) -> Result<&[EntryId]> {
        self.node(id).map(|node| node.settings.as_slice())
    }

    /// The existing child node at `key`, if any.
    pub fn child_node(&self, parent: NodeId, key: &str) -> Result<Option<NodeId>> {
        self.node(parent)?;
        Ok(self.child_node_id(parent, key))
    }

    /// The existing child entry at `key`, if any.
    pub fn child_setting(&self, parent: NodeId, key: &str) -> Result<Option<EntryId>> {
        self.node(parent)?;
        Ok(self.child_setting_id(parent, key))
    }

    /// Resolve a node by its tree path of local keys (e.g. `"network/servers"`).
    ///
    /// The path uses local keys only; it does not include the `items/%N`
    /// storage segments of named lists. The empty path resolves to the root.
    pub fn node_at_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root;
        if path.is_empty() {
            return Some(current);
        }
        for segment in path.split(KEY_SEPARATOR) {
            current = self.child_node_id(current, segment)?;
        }
        Some(current)
    }

    /// Resolve an entry by its tree path of local keys
    /// (e.g. `"network/servers/timeout"`).
    pub fn setting_at_path(&self, path: &str) -> Option<EntryId> {
        let (node_path, key) = path.rsplit_once(KEY_SEPARATOR).unwrap_or(("", path));
        let node = self.node_at_path(node_path)?;
        self.child_setting_id(node, key)
    }

    /// The options of a named list node.
    pub fn named_list_options(&self, id: NodeId) -> Result<NamedListOptions> {
        self.named_list(id).map(|node| node.options)
    }

    /// The key prefix under which a named list stores its item instances.
    ///
    /// Contains one placeholder per *outer* named-list ancestor; the final
    /// dynamic segment (this list's own items) is the enumeration wildcard.
    pub fn items_complete_key(&self, id: NodeId) -> Result<&str> {
        self.named_list(id).map(|node| node.items_complete_key.as_str())
    }

    /// The companion selected-item entry of a named list, if enabled.
    pub fn selected_item_entry(&self, id: NodeId) -> Result<Option<EntryId>> {
        self.named_list(id).map(|node| node.selected_item_entry)
    }

    /// The local key of an entry.
    pub fn entry_key(&self, id: EntryId) -> Result<&str> {
        self.entry(id).map(|entry| entry.key.as_str())
    }

    /// The complete key template of an entry, placeholders included.
    pub fn entry_definition_key(&self, id: EntryId) -> Result<&str> {
        self.entry(id).map(|entry| entry.definition_key.as_str())
    }

    /// The number of dynamic key parts an entry requires.
    pub fn entry_dynamic_parts(&self, id: EntryId) -> Result<usize> {
        self.entry(id).map(|entry| entry.dynamic_parts)
    }

    /// Whether part of the entry's key is built dynamically.
    pub fn entry_has_dynamic_key(&self, id: EntryId) -> Result<bool> {
        self.entry(id).map(|entry| entry.dynamic_parts > 0)
    }

    /// The declared kind of an entry.
    pub fn entry_kind(&self, id: EntryId) -> Result<SettingsKind> {
        self.entry(id).map(|entry| entry.kind)
    }

    /// The untyped default value of an entry.
    pub fn entry_default(&self, id: EntryId) -> Result<&SettingsValue> {
        self.entry(id).map(|entry| &entry.default)
    }

    /// The description of an entry.
    pub fn entry_description(&self, id: EntryId) -> Result<&str> {
        self.entry(id).map(|entry| entry.description.as_str())
    }

    /// The options of an entry.
    pub fn entry_options(&self, id: EntryId) -> Result<EntryOptions> {
        self.entry(id).map(|entry| entry.options)
    }

    /// The node an entry is registered under, or `None` for detached
    /// (section-keyed) entries.
    pub fn entry_parent(&self, id: EntryId) -> Result<Option<NodeId>> {
        self.entry(id).map(|entry| entry.parent)
    }

    /// A full metadata snapshot of an entry.
    pub fn entry_info(&self, id: EntryId) -> Result<EntryInfo> {
        let entry = self.entry(id)?;
        Ok(EntryInfo {
            key: entry.key.clone(),
            definition_key: entry.definition_key.clone(),
            dynamic_parts: entry.dynamic_parts,
            kind: entry.kind,
            default: entry.default.clone(),
            description: entry.description.clone(),
            options: entry.options,
            parent: entry.parent,
        })
    }

    // ------------------------------------------------------------------
    // Mutation (crate-internal; reached through SettingsRegistry)
    // ------------------------------------------------------------------

    pub(crate) fn create_child_node(&mut self, parent: NodeId, key: &str) -> Result<NodeId> {
        validate_segment(key)?;
        let (parent_complete, parent_named) = self.node_context(parent)?;

        if let Some(existing) = self.child_node_id(parent, key) {
            // Lookup-or-create is idempotent for matching kinds only.
            if self.nodes.get(existing).map(|node| node.kind) == Some(NodeKind::Standard) {
                return Ok(existing);
            }
            return Err(SettingsError::kind_mismatch(key, parent_complete));
        }
        if self.child_setting_id(parent, key).is_some() {
            return Err(SettingsError::duplicate_key(key, parent_complete));
        }

        let complete_key = compose_child_key(&parent_complete, key);
        tracing::trace!(target: targets::TREE, key, complete_key = %complete_key, "created child node");
        let id = self.nodes.insert(NodeData {
            kind: NodeKind::Standard,
            key: key.to_string(),
            complete_key,
            named_nodes_count: parent_named,
            parent: Some(parent),
            children: Vec::new(),
            settings: Vec::new(),
            options: NamedListOptions::default(),
            items_complete_key: String::new(),
            selected_item_entry: None,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub(crate) fn create_named_list_node(
        &mut self,
        parent: NodeId,
        key: &str,
        options: NamedListOptions,
    ) -> Result<NodeId> {
        validate_segment(key)?;
        let (parent_complete, parent_named) = self.node_context(parent)?;

        if let Some(existing) = self.child_node_id(parent, key) {
            if self.nodes.get(existing).map(|node| node.kind) == Some(NodeKind::NamedList) {
                if self.nodes.get(existing).map(|node| node.options) != Some(options) {
                    tracing::warn!(
                        target: targets::TREE,
                        key,
                        "named list already exists with different options; keeping the original"
                    );
                }
                return Ok(existing);
            }
            return Err(SettingsError::kind_mismatch(key, parent_complete));
        }
        if self.child_setting_id(parent, key).is_some() {
            return Err(SettingsError::duplicate_key(key, parent_complete));
        }

        let base_key = compose_child_key(&parent_complete, key);
        let named_nodes_count = parent_named + 1;
        let complete_key = format!("{base_key}/items/%{named_nodes_count}");
        let items_complete_key = format!("{base_key}/items");

        // The selection is stored per parent context, so the companion entry
        // takes one dynamic part fewer than the list's own items.
        let selected_item_entry = options.selected_item.then(|| {
            self.entries.insert(EntryData {
                key: "selected".to_string(),
                definition_key: format!("{base_key}/selected"),
                dynamic_parts: parent_named,
                kind: SettingsKind::String,
                default: SettingsValue::String(String::new()),
                description: format!("Currently selected item of the '{key}' list"),
                options: EntryOptions::default(),
                parent: None,
            })
        });

        tracing::trace!(target: targets::TREE, key, complete_key = %complete_key, "created named list node");
        let id = self.nodes.insert(NodeData {
            kind: NodeKind::NamedList,
            key: key.to_string(),
            complete_key,
            named_nodes_count,
            parent: Some(parent),
            children: Vec::new(),
            settings: Vec::new(),
            options,
            items_complete_key,
            selected_item_entry,
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub(crate) fn register_entry(
        &mut self,
        parent: NodeId,
        key: &str,
        kind: SettingsKind,
        default: SettingsValue,
        description: String,
        options: EntryOptions,
    ) -> Result<EntryId> {
        validate_segment(key)?;
        let (parent_complete, parent_named) = self.node_context(parent)?;

        if self.child_node_id(parent, key).is_some() || self.child_setting_id(parent, key).is_some()
        {
            return Err(SettingsError::duplicate_key(key, parent_complete));
        }

        // The local key cannot carry placeholders, so the entry's arity is
        // exactly the parent's named-nodes count.
        let definition_key = compose_child_key(&parent_complete, key);
        tracing::trace!(target: targets::TREE, key, definition_key = %definition_key, "registered entry");
        let id = self.entries.insert(EntryData {
            key: key.to_string(),
            definition_key,
            dynamic_parts: parent_named,
            kind,
            default,
            description,
            options,
            parent: Some(parent),
        });
        if let Some(node) = self.nodes.get_mut(parent) {
            node.settings.push(id);
        }
        Ok(id)
    }

    pub(crate) fn register_detached_entry(
        &mut self,
        definition_key: &str,
        kind: SettingsKind,
        default: SettingsValue,
        description: String,
        options: EntryOptions,
    ) -> Result<EntryId> {
        let indices = validate_definition_key(definition_key)?;
        let dynamic_parts = indices.last().copied().unwrap_or(0);

        let key = definition_key
            .rsplit(KEY_SEPARATOR)
            .next()
            .unwrap_or(definition_key)
            .to_string();
        tracing::trace!(target: targets::TREE, definition_key, "registered detached entry");
        Ok(self.entries.insert(EntryData {
            key,
            definition_key: definition_key.to_string(),
            dynamic_parts,
            kind,
            default,
            description,
            options,
            parent: None,
        }))
    }

    pub(crate) fn unregister_entry(&mut self, id: EntryId) -> Result<()> {
        let data = self.entries.remove(id).ok_or(SettingsError::UnknownEntry)?;
        if let Some(parent) = data.parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.settings.retain(|&entry| entry != id);
            }
        }
        tracing::trace!(target: targets::TREE, key = %data.definition_key, "unregistered entry");
        Ok(())
    }

    pub(crate) fn unregister_node(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SettingsError::CannotRemoveRoot);
        }
        if !self.nodes.contains_key(id) {
            return Err(SettingsError::UnknownNode);
        }

        // Detach from the parent, then dispose the subtree children-first.
        if let Some(parent) = self.nodes.get(id).and_then(|node| node.parent) {
            if let Some(parent_data) = self.nodes.get_mut(parent) {
                parent_data.children.retain(|&child| child != id);
            }
        }
        let mut doomed = Vec::new();
        self.collect_descendants(id, &mut doomed);
        doomed.push(id);
        for node_id in doomed {
            if let Some(data) = self.nodes.remove(node_id) {
                for entry in data.settings {
                    self.entries.remove(entry);
                }
                if let Some(selected) = data.selected_item_entry {
                    self.entries.remove(selected);
                }
            }
        }
        tracing::trace!(target: targets::TREE, ?id, "unregistered node subtree");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id).ok_or(SettingsError::UnknownNode)
    }

    fn named_list(&self, id: NodeId) -> Result<&NodeData> {
        let node = self.node(id)?;
        if node.kind != NodeKind::NamedList {
            return Err(SettingsError::NotNamedList {
                key: node.key.clone(),
            });
        }
        Ok(node)
    }

    fn entry(&self, id: EntryId) -> Result<&EntryData> {
        self.entries.get(id).ok_or(SettingsError::UnknownEntry)
    }

    fn node_context(&self, id: NodeId) -> Result<(String, usize)> {
        let node = self.node(id)?;
        Ok((node.complete_key.clone(), node.named_nodes_count))
    }

    fn child_node_id(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.nodes
            .get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes.get(child).is_some_and(|node| node.key == key))
    }

    fn child_setting_id(&self, parent: NodeId, key: &str) -> Option<EntryId> {
        self.nodes
            .get(parent)?
            .settings
            .iter()
            .copied()
            .find(|&entry| self.entries.get(entry).is_some_and(|data| data.key == key))
    }

    /// Collect descendant node ids depth-first, children before parents.
    fn collect_descendants(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(id) {
            for &child in &data.children {
                self.collect_descendants(child, result);
                result.push(child);
            }
        }
    }
}

// ----------------------------------------------------------------------
// Key algorithms
// ----------------------------------------------------------------------

fn compose_child_key(parent_complete: &str, key: &str) -> String {
    if parent_complete.is_empty() {
        key.to_string()
    } else {
        format!("{parent_complete}{KEY_SEPARATOR}{key}")
    }
}

fn placeholder(index: usize) -> String {
    format!("%{index}")
}

fn validate_segment(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SettingsError::invalid_key(key, "key must not be empty"));
    }
    if key.contains(KEY_SEPARATOR) {
        return Err(SettingsError::invalid_key(
            key,
            "key must not contain the separator",
        ));
    }
    if key.contains('%') {
        return Err(SettingsError::invalid_key(
            key,
            "key must not contain placeholder characters",
        ));
    }
    Ok(())
}

pub(crate) fn validate_dynamic_part(part: &str) -> Result<()> {
    if part.is_empty() {
        return Err(SettingsError::invalid_key(
            part,
            "dynamic key part must not be empty",
        ));
    }
    if part.contains(KEY_SEPARATOR) {
        return Err(SettingsError::invalid_key(
            part,
            "dynamic key part must not contain the separator",
        ));
    }
    if part.contains('%') {
        return Err(SettingsError::invalid_key(
            part,
            "dynamic key part must not contain placeholder characters",
        ));
    }
    Ok(())
}

/// Validate a detached definition key and return its placeholder indices.
///
/// Placeholder indices must be contiguous starting at `%1` so that every
/// supplied dynamic part lands somewhere.
fn validate_definition_key(definition_key: &str) -> Result<Vec<usize>> {
    if definition_key.is_empty() {
        return Err(SettingsError::invalid_key(
            definition_key,
            "key must not be empty",
        ));
    }
    if definition_key
        .split(KEY_SEPARATOR)
        .any(|segment| segment.is_empty())
    {
        return Err(SettingsError::invalid_key(
            definition_key,
            "key must not contain empty segments",
        ));
    }
    let indices: Vec<usize> = placeholder_indices(definition_key).into_iter().collect();
    for (position, index) in indices.iter().enumerate() {
        if *index != position + 1 {
            return Err(SettingsError::invalid_key(
                definition_key,
                "placeholder indices must be contiguous starting at %1",
            ));
        }
    }
    Ok(indices)
}

/// The set of `%N` placeholder indices present in a key template.
fn placeholder_indices(template: &str) -> BTreeSet<usize> {
    let mut indices = BTreeSet::new();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let mut j = i + 1;
            let mut index = 0usize;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                index = index * 10 + usize::from(bytes[j] - b'0');
                j += 1;
            }
            if j > i + 1 && index > 0 {
                indices.insert(index);
            }
            i = j.max(i + 1);
        } else {
            i += 1;
        }
    }
    indices
}

/// Substitute dynamic key parts into a key template.
///
/// The number of parts must match the template's declared arity; this is the
/// primary correctness invariant of the dynamic-key mechanism.
pub(crate) fn substitute_parts(template: &str, expected: usize, parts: &[&str]) -> Result<String> {
    if parts.len() != expected {
        return Err(SettingsError::DynamicPartsMismatch {
            key: template.to_string(),
            expected,
            got: parts.len(),
        });
    }
    for part in parts {
        validate_dynamic_part(part)?;
    }
    let mut key = template.to_string();
    // Highest index first, so %1 is not replaced inside %10 and later.
    for (index, part) in parts.iter().enumerate().rev() {
        key = key.replace(&placeholder(index + 1), part);
    }
    Ok(key)
}

/// Substitute dynamic key parts into a foreign key template.
///
/// Used for copy migrations where the literal source/target key may carry
/// placeholders; no arity is enforced on the foreign template.
pub(crate) fn substitute_parts_lenient(template: &str, parts: &[&str]) -> String {
    let mut key = template.to_string();
    for (index, part) in parts.iter().enumerate().rev() {
        key = key.replace(&placeholder(index + 1), part);
    }
    key
}

/// Whether a concrete storage key matches a definition-key template.
///
/// Placeholder segments accept any non-empty concrete segment; all other
/// segments must match exactly.
pub(crate) fn key_matches_template(template: &str, key: &str) -> bool {
    let template_segments: Vec<&str> = template.split(KEY_SEPARATOR).collect();
    let key_segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    if template_segments.len() != key_segments.len() {
        return false;
    }
    template_segments
        .iter()
        .zip(key_segments.iter())
        .all(|(template_segment, key_segment)| {
            if is_placeholder(template_segment) {
                !key_segment.is_empty()
            } else {
                template_segment == key_segment
            }
        })
}

fn is_placeholder(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('%')
        && segment[1..].bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_standard_node() -> (SettingsTree, NodeId) {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let node = tree.create_child_node(root, "network").unwrap();
        (tree, node)
    }

    #[test]
    fn create_child_node_is_idempotent() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let first = tree.create_child_node(root, "network").unwrap();
        let second = tree.create_child_node(root, "network").unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.children_nodes(root).unwrap().len(), 1);
    }

    #[test]
    fn create_child_node_rejects_kind_mismatch() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        tree.create_named_list_node(root, "servers", NamedListOptions::default())
            .unwrap();
        let err = tree.create_child_node(root, "servers").unwrap_err();
        assert!(matches!(err, SettingsError::KindMismatch { .. }));

        // Same kind is idempotent, so recreating the named list succeeds.
        assert!(
            tree.create_named_list_node(root, "servers", NamedListOptions::default())
                .is_ok()
        );
    }

    #[test]
    fn node_key_collides_with_entry_key() {
        let (mut tree, node) = tree_with_standard_node();
        tree.register_entry(
            node,
            "timeout",
            SettingsKind::Integer,
            SettingsValue::Int(30),
            String::new(),
            EntryOptions::default(),
        )
        .unwrap();
        let err = tree.create_child_node(node, "timeout").unwrap_err();
        assert!(matches!(err, SettingsError::DuplicateKey { .. }));
    }

    #[test]
    fn duplicate_entry_registration_fails() {
        let (mut tree, node) = tree_with_standard_node();
        tree.register_entry(
            node,
            "timeout",
            SettingsKind::Integer,
            SettingsValue::Int(30),
            String::new(),
            EntryOptions::default(),
        )
        .unwrap();
        let err = tree
            .register_entry(
                node,
                "timeout",
                SettingsKind::Integer,
                SettingsValue::Int(10),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SettingsError::DuplicateKey { .. }));
    }

    #[test]
    fn complete_keys_carry_placeholders() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let projects = tree
            .create_named_list_node(root, "projects", NamedListOptions::default())
            .unwrap();
        let layers = tree
            .create_named_list_node(projects, "layers", NamedListOptions::default())
            .unwrap();
        let entry = tree
            .register_entry(
                layers,
                "opacity",
                SettingsKind::Double,
                SettingsValue::Double(1.0),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap();

        assert_eq!(tree.node_complete_key(projects).unwrap(), "projects/items/%1");
        assert_eq!(
            tree.node_complete_key(layers).unwrap(),
            "projects/items/%1/layers/items/%2"
        );
        assert_eq!(tree.named_nodes_count(layers).unwrap(), 2);
        assert_eq!(
            tree.entry_definition_key(entry).unwrap(),
            "projects/items/%1/layers/items/%2/opacity"
        );
        assert_eq!(tree.entry_dynamic_parts(entry).unwrap(), 2);
        assert!(tree.entry_has_dynamic_key(entry).unwrap());
    }

    #[test]
    fn selected_item_entry_uses_parent_arity() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let projects = tree
            .create_named_list_node(root, "projects", NamedListOptions::default())
            .unwrap();
        let layers = tree
            .create_named_list_node(projects, "layers", NamedListOptions { selected_item: true })
            .unwrap();

        let selected = tree.selected_item_entry(layers).unwrap().unwrap();
        assert_eq!(
            tree.entry_definition_key(selected).unwrap(),
            "projects/items/%1/layers/selected"
        );
        assert_eq!(tree.entry_dynamic_parts(selected).unwrap(), 1);
        assert!(tree.selected_item_entry(projects).unwrap().is_none());
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        assert!(matches!(
            tree.create_child_node(root, "").unwrap_err(),
            SettingsError::InvalidKey { .. }
        ));
        assert!(matches!(
            tree.create_child_node(root, "a/b").unwrap_err(),
            SettingsError::InvalidKey { .. }
        ));
        assert!(matches!(
            tree.create_child_node(root, "a%1").unwrap_err(),
            SettingsError::InvalidKey { .. }
        ));
    }

    #[test]
    fn path_lookup_finds_nodes_and_settings() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let network = tree.create_child_node(root, "network").unwrap();
        let servers = tree
            .create_named_list_node(network, "servers", NamedListOptions::default())
            .unwrap();
        let timeout = tree
            .register_entry(
                servers,
                "timeout",
                SettingsKind::Integer,
                SettingsValue::Int(30),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap();

        assert_eq!(tree.node_at_path(""), Some(root));
        assert_eq!(tree.node_at_path("network"), Some(network));
        assert_eq!(tree.node_at_path("network/servers"), Some(servers));
        assert_eq!(tree.node_at_path("network/unknown"), None);
        assert_eq!(tree.setting_at_path("network/servers/timeout"), Some(timeout));
        assert_eq!(tree.setting_at_path("network/servers/missing"), None);
    }

    #[test]
    fn unregister_node_disposes_subtree() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        let network = tree.create_child_node(root, "network").unwrap();
        let servers = tree
            .create_named_list_node(network, "servers", NamedListOptions { selected_item: true })
            .unwrap();
        let selected = tree.selected_item_entry(servers).unwrap().unwrap();
        let timeout = tree
            .register_entry(
                servers,
                "timeout",
                SettingsKind::Integer,
                SettingsValue::Int(30),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap();

        tree.unregister_node(network).unwrap();
        assert!(!tree.contains_node(network));
        assert!(!tree.contains_node(servers));
        assert!(!tree.contains_entry(timeout));
        assert!(!tree.contains_entry(selected));
        assert!(tree.children_nodes(root).unwrap().is_empty());
    }

    #[test]
    fn root_cannot_be_unregistered() {
        let mut tree = SettingsTree::new();
        let root = tree.root();
        assert_eq!(
            tree.unregister_node(root).unwrap_err(),
            SettingsError::CannotRemoveRoot
        );
    }

    #[test]
    fn substitution_enforces_arity() {
        let template = "projects/items/%1/layers/items/%2/opacity";
        assert_eq!(
            substitute_parts(template, 2, &["p", "l"]).unwrap(),
            "projects/items/p/layers/items/l/opacity"
        );
        let err = substitute_parts(template, 2, &["p"]).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::DynamicPartsMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
        assert!(substitute_parts(template, 2, &["p", "a/b"]).is_err());
    }

    #[test]
    fn lenient_substitution_ignores_arity() {
        assert_eq!(
            substitute_parts_lenient("old/%1/timeout", &["prod"]),
            "old/prod/timeout"
        );
        assert_eq!(substitute_parts_lenient("old/timeout", &["prod"]), "old/timeout");
    }

    #[test]
    fn template_matching() {
        let template = "feeds/%1/%2/content";
        assert!(key_matches_template(template, "feeds/news/27/content"));
        assert!(!key_matches_template(template, "feeds/news/content"));
        assert!(!key_matches_template(template, "feeds/news/27/title"));
        assert!(!key_matches_template(template, "feeds//27/content"));
    }

    #[test]
    fn detached_definition_keys_are_validated() {
        let mut tree = SettingsTree::new();
        let err = tree
            .register_detached_entry(
                "plugins/%2/enabled",
                SettingsKind::Bool,
                SettingsValue::Bool(false),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidKey { .. }));

        let entry = tree
            .register_detached_entry(
                "plugins/%1/enabled",
                SettingsKind::Bool,
                SettingsValue::Bool(false),
                String::new(),
                EntryOptions::default(),
            )
            .unwrap();
        assert_eq!(tree.entry_dynamic_parts(entry).unwrap(), 1);
        assert_eq!(tree.entry_key(entry).unwrap(), "enabled");
    }
}
