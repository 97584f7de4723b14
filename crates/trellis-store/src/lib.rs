//! Value model and backing-store capability for the Trellis settings
//! registry.
//!
//! This crate provides the pieces the registry in `trellis-settings` builds
//! on:
//!
//! - **[`SettingsValue`]**: the closed tagged variant stored values take
//! - **[`Color`]**: an 8-bit RGBA color with hex round-tripping
//! - **[`SettingsStore`]**: the capability trait for the untyped key-value
//!   store (persistent engines implement this)
//! - **[`MemoryStore`]**: a two-layer (local/global) in-memory reference
//!   implementation
//!
//! # Example
//!
//! ```
//! use trellis_store::{MemoryStore, Origin, SettingsStore, SettingsValue};
//!
//! let store = MemoryStore::new();
//! store.set_value_in(Origin::Global, "app/theme", SettingsValue::from("light"));
//! store.set_value("app/theme", SettingsValue::from("dark"));
//!
//! // Local overrides global.
//! assert_eq!(store.value("app/theme"), Some(SettingsValue::from("dark")));
//! assert_eq!(store.origin_of("app/theme"), Origin::Local);
//! ```

mod color;
mod store;
mod value;

pub use color::Color;
pub use store::{MemoryStore, Origin, SettingsStore};
pub use value::{SettingsKind, SettingsValue, VariantMap};
