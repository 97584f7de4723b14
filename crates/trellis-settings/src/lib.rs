//! Typed, hierarchical settings registry with dynamic keys.
//!
//! Application code declares settings entries with defaults, descriptions,
//! and validation, organized in a tree of nodes. *Named list* nodes make
//! keys dynamic: every entry below one resolves per named item, so the same
//! logical setting exists once per configured server, plugin, or layer.
//!
//! The registry sits on an untyped key-value store (the [`SettingsStore`]
//! trait from `trellis-store`); [`MemoryStore`] is the in-memory reference
//! implementation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_settings::{
//!     EntryDef, MemoryStore, NamedListOptions, SettingsError, SettingsRegistry,
//! };
//!
//! fn main() -> Result<(), SettingsError> {
//!     let mut registry = SettingsRegistry::new(Arc::new(MemoryStore::new()));
//!
//!     let root = registry.root();
//!     let network = registry.create_child_node(root, "network")?;
//!     let servers = registry.create_named_list_node(
//!         network,
//!         "servers",
//!         NamedListOptions { selected_item: true },
//!     )?;
//!
//!     let timeout = registry.register_entry(
//!         servers,
//!         EntryDef::new("timeout", 30i64)
//!             .description("Connection timeout in seconds")
//!             .check(|v| *v > 0),
//!     )?;
//!
//!     timeout.set_value_for(&registry, 45, &["prod"])?;
//!     assert_eq!(timeout.value_for(&registry, &["prod"])?, 45);
//!     assert_eq!(timeout.value_for(&registry, &["staging"])?, 30);
//!     assert_eq!(registry.items(servers, &[])?, vec!["prod".to_string()]);
//!     Ok(())
//! }
//! ```

mod entry;
mod error;
pub mod logging;
mod registry;
mod tree;

pub use entry::{EntryDef, SettingsEntry, SettingsType};
pub use error::{Result, SettingsError};
pub use logging::{SettingsTreeDebug, TreeFormatOptions, TreeStyle};
pub use registry::SettingsRegistry;
pub use tree::{
    EntryId, EntryInfo, EntryOptions, KEY_SEPARATOR, NamedListOptions, NodeId, NodeKind,
    SettingsTree,
};

// Store-layer types, re-exported so most applications need one import path.
pub use trellis_store::{
    Color, MemoryStore, Origin, SettingsKind, SettingsStore, SettingsValue, VariantMap,
};
