//! Prelude module for Trellis.
//!
//! This module re-exports the most commonly used types for convenient
//! importing:
//!
//! ```ignore
//! use trellis::prelude::*;
//! ```
//!
//! This provides access to:
//! - The registry (`SettingsRegistry`, `SettingsError`)
//! - Entry declaration (`EntryDef`, `SettingsEntry`, `SettingsType`)
//! - Tree structure (`NodeId`, `NodeKind`, `NamedListOptions`)
//! - The value model (`SettingsValue`, `SettingsKind`, `Color`)
//! - Backing stores (`SettingsStore`, `MemoryStore`, `Origin`)

// ============================================================================
// Registry
// ============================================================================

pub use crate::{Result, SettingsError, SettingsRegistry};

// ============================================================================
// Entry Declaration
// ============================================================================

pub use crate::{EntryDef, EntryOptions, SettingsEntry, SettingsType};

// ============================================================================
// Tree Structure
// ============================================================================

pub use crate::{EntryId, NamedListOptions, NodeId, NodeKind, SettingsTree};

// ============================================================================
// Value Model
// ============================================================================

pub use crate::{Color, SettingsKind, SettingsValue, VariantMap};

// ============================================================================
// Backing Stores
// ============================================================================

pub use crate::{MemoryStore, Origin, SettingsStore};
