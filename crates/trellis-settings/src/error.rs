//! Error types for the settings registry.
//!
//! Structural errors (duplicate keys, arity mismatches, stale handles)
//! indicate a programming error by the tree author and surface immediately
//! at registration or resolution time. Validation failures and absent
//! values are *not* errors: `set_value` reports rejection as `Ok(false)`,
//! and reads fall back to the entry default.

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur in the settings registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A child node or entry with the same local key already exists at this
    /// level.
    #[error("key '{key}' already exists under '{parent}'")]
    DuplicateKey {
        /// The colliding local key.
        key: String,
        /// The complete key of the parent node.
        parent: String,
    },

    /// The key names an existing child of a different element kind.
    #[error("'{key}' under '{parent}' already exists as a different element kind")]
    KindMismatch {
        /// The colliding local key.
        key: String,
        /// The complete key of the parent node.
        parent: String,
    },

    /// The key or dynamic key part is malformed.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey {
        /// The offending key.
        key: String,
        /// Why the key was rejected.
        reason: &'static str,
    },

    /// The number of supplied dynamic key parts does not match the key
    /// definition.
    #[error("'{key}' expects {expected} dynamic key part(s), got {got}")]
    DynamicPartsMismatch {
        /// The key template being resolved.
        key: String,
        /// The number of placeholders in the definition.
        expected: usize,
        /// The number of parts supplied by the caller.
        got: usize,
    },

    /// The node handle is invalid or has been unregistered.
    #[error("invalid or unregistered node handle")]
    UnknownNode,

    /// The entry handle is invalid or has been unregistered.
    #[error("invalid or unregistered entry handle")]
    UnknownEntry,

    /// The operation requires a named list node.
    #[error("node '{key}' is not a named list")]
    NotNamedList {
        /// The local key of the node.
        key: String,
    },

    /// The named list was created without the selected-item option.
    #[error("named list '{key}' has no selected-item setting")]
    SelectedItemNotEnabled {
        /// The local key of the named list node.
        key: String,
    },

    /// The root node cannot be unregistered.
    #[error("the root node cannot be unregistered")]
    CannotRemoveRoot,
}

impl SettingsError {
    /// Create a duplicate-key error.
    pub fn duplicate_key(key: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::DuplicateKey {
            key: key.into(),
            parent: parent.into(),
        }
    }

    /// Create a kind-mismatch error.
    pub fn kind_mismatch(key: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::KindMismatch {
            key: key.into(),
            parent: parent.into(),
        }
    }

    /// Create an invalid-key error.
    pub fn invalid_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason,
        }
    }
}
