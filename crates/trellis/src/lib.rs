//! Trellis - a typed, hierarchical settings registry.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut registry = SettingsRegistry::new(Arc::new(MemoryStore::new()));
//!     let app = registry.create_child_node(registry.root(), "app")?;
//!     let theme = registry.register_entry(app, EntryDef::new("theme", String::from("light")))?;
//!
//!     theme.set_value(&registry, "dark".to_string())?;
//!     assert_eq!(theme.value(&registry)?, "dark");
//!     Ok(())
//! }
//! ```

pub use trellis_settings::*;

/// Backing-store module.
pub mod store {
    pub use trellis_store::*;
}

pub mod prelude;
