//! Typed settings entries.
//!
//! [`EntryDef`] describes a setting before registration: its local key,
//! typed default, description, options, and an optional validation check.
//! Registering a definition with [`crate::SettingsRegistry`] yields a
//! [`SettingsEntry`] handle that carries the typed default and check, so
//! reads can fall back without re-converting the stored default.
//!
//! The value type of an entry is fixed by the [`SettingsType`]
//! implementation of `T`. The built-in implementations cover the closed set
//! of stored kinds; domain types serialize through one of them (usually
//! [`SettingsKind::Custom`] over a string encoding).

use std::fmt;
use std::sync::Arc;

use trellis_store::{Color, SettingsKind, SettingsValue, VariantMap};

use crate::tree::EntryOptions;

/// A value type storable as a settings entry.
///
/// Implementations declare the stored [`SettingsKind`] and convert between
/// the typed value and the untyped [`SettingsValue`]. `from_value` is
/// lenient: it accepts any stored value the kind's coercion rules can make
/// sense of, and returns `None` otherwise (the registry then falls back to
/// the entry default).
pub trait SettingsType: Clone + Send + Sync + 'static {
    /// The kind tag under which values of this type are stored.
    const KIND: SettingsKind;

    /// Convert the typed value into its stored representation.
    fn into_value(self) -> SettingsValue;

    /// Convert a stored value back, coercing compatible representations.
    fn from_value(value: &SettingsValue) -> Option<Self>;
}

impl SettingsType for bool {
    const KIND: SettingsKind = SettingsKind::Bool;

    fn into_value(self) -> SettingsValue {
        SettingsValue::Bool(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_bool()
    }
}

impl SettingsType for i64 {
    const KIND: SettingsKind = SettingsKind::Integer;

    fn into_value(self) -> SettingsValue {
        SettingsValue::Int(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_i64()
    }
}

impl SettingsType for f64 {
    const KIND: SettingsKind = SettingsKind::Double;

    fn into_value(self) -> SettingsValue {
        SettingsValue::Double(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_f64()
    }
}

impl SettingsType for String {
    const KIND: SettingsKind = SettingsKind::String;

    fn into_value(self) -> SettingsValue {
        SettingsValue::String(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_string()
    }
}

impl SettingsType for Vec<String> {
    const KIND: SettingsKind = SettingsKind::StringList;

    fn into_value(self) -> SettingsValue {
        SettingsValue::StringList(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_string_list()
    }
}

impl SettingsType for VariantMap {
    const KIND: SettingsKind = SettingsKind::VariantMap;

    fn into_value(self) -> SettingsValue {
        SettingsValue::Map(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_map().cloned()
    }
}

impl SettingsType for Color {
    const KIND: SettingsKind = SettingsKind::Color;

    fn into_value(self) -> SettingsValue {
        SettingsValue::Color(self)
    }

    fn from_value(value: &SettingsValue) -> Option<Self> {
        value.as_color()
    }
}

type Check<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A settings entry definition, built before registration.
///
/// # Example
///
/// ```
/// use trellis_settings::EntryDef;
///
/// let timeout = EntryDef::new("timeout", 30i64)
///     .description("Connection timeout in seconds")
///     .check(|value| *value > 0);
/// assert_eq!(timeout.key(), "timeout");
/// ```
pub struct EntryDef<T: SettingsType> {
    key: String,
    default: T,
    description: String,
    options: EntryOptions,
    check: Option<Check<T>>,
}

impl<T: SettingsType> EntryDef<T> {
    /// Create a definition with a local key and a default value.
    pub fn new(key: impl Into<String>, default: T) -> Self {
        Self {
            key: key.into(),
            default,
            description: String::new(),
            options: EntryOptions::default(),
            check: None,
        }
    }

    /// Set the human-readable description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Keep a copy of the previous value whenever the stored value changes.
    ///
    /// The copy is retrievable through
    /// [`crate::SettingsRegistry::former_value`].
    pub fn save_former_value(mut self) -> Self {
        self.options.save_former_value = true;
        self
    }

    /// Attach a validation check; writes of values failing the check are
    /// rejected (reported as `Ok(false)`), and reads of stored values
    /// failing it fall back to the default.
    pub fn check(mut self, check: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }

    /// The local key of this definition.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The typed default value.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// The human-readable description.
    pub fn description_text(&self) -> &str {
        &self.description
    }

    /// The entry options.
    pub fn options(&self) -> EntryOptions {
        self.options
    }

    pub(crate) fn into_parts(self) -> (String, T, String, EntryOptions, Option<Check<T>>) {
        (
            self.key,
            self.default,
            self.description,
            self.options,
            self.check,
        )
    }
}

impl<T: SettingsType + fmt::Debug> fmt::Debug for EntryDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryDef")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}

/// A typed handle to a registered settings entry.
///
/// Obtained from [`crate::SettingsRegistry::register_entry`] (or the
/// detached variant). The handle carries the typed default and the optional
/// validation check, so value access through the registry never needs to
/// convert the default back from its stored form.
pub struct SettingsEntry<T: SettingsType> {
    id: crate::tree::EntryId,
    default: T,
    check: Option<Check<T>>,
}

impl<T: SettingsType> SettingsEntry<T> {
    pub(crate) fn new(id: crate::tree::EntryId, default: T, check: Option<Check<T>>) -> Self {
        Self { id, default, check }
    }

    /// The untyped handle of this entry in the tree.
    pub fn id(&self) -> crate::tree::EntryId {
        self.id
    }

    /// The typed default value.
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Whether `value` passes this entry's validation check.
    ///
    /// Entries without a check accept every value.
    pub fn accepts(&self, value: &T) -> bool {
        self.check.as_ref().is_none_or(|check| check(value))
    }
}

impl<T: SettingsType> Clone for SettingsEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            default: self.default.clone(),
            check: self.check.clone(),
        }
    }
}

impl<T: SettingsType + fmt::Debug> fmt::Debug for SettingsEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsEntry")
            .field("id", &self.id)
            .field("default", &self.default)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}
