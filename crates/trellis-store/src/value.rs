//! Untyped settings values.
//!
//! [`SettingsValue`] is the closed tagged variant that flows between the
//! typed entry layer and the backing store. Accessors coerce where a
//! reasonable interpretation exists (numeric strings, `0`/`1` booleans, hex
//! color strings) and return `None` otherwise, so readers can always fall
//! back to an entry's default instead of failing on malformed stored data.

use std::collections::BTreeMap;
use std::fmt;

use crate::color::Color;

/// An untyped map of settings values, keyed by string.
pub type VariantMap = BTreeMap<String, SettingsValue>;

/// The kind of a settings entry, for introspection and tooling.
///
/// This is the entry-level counterpart of [`SettingsValue`]'s variants.
/// `Custom` marks entries whose Rust type is application-defined and
/// marshalled through one of the built-in variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKind {
    /// Boolean value.
    Bool,
    /// 64-bit signed integer value.
    Integer,
    /// 64-bit floating point value.
    Double,
    /// String value.
    String,
    /// List of strings.
    StringList,
    /// Nested map of values.
    VariantMap,
    /// RGBA color.
    Color,
    /// Application-defined type marshalled through a built-in variant.
    Custom,
}

impl fmt::Display for SettingsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "Bool",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::String => "String",
            Self::StringList => "StringList",
            Self::VariantMap => "VariantMap",
            Self::Color => "Color",
            Self::Custom => "Custom",
        };
        f.write_str(name)
    }
}

/// A stored settings value.
///
/// The variant set is closed: every value a store can hold is one of these.
/// Typed entries convert to and from this representation through
/// `SettingsType` in `trellis-settings`.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsValue {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer value.
    Int(i64),
    /// 64-bit floating point value.
    Double(f64),
    /// String value.
    String(String),
    /// List of strings.
    StringList(Vec<String>),
    /// Nested map of values.
    Map(VariantMap),
    /// RGBA color.
    Color(Color),
}

impl SettingsValue {
    /// The kind of this value.
    ///
    /// Note that this never returns [`SettingsKind::Custom`]: custom entry
    /// types are marshalled through one of the built-in variants.
    pub fn kind(&self) -> SettingsKind {
        match self {
            Self::Bool(_) => SettingsKind::Bool,
            Self::Int(_) => SettingsKind::Integer,
            Self::Double(_) => SettingsKind::Double,
            Self::String(_) => SettingsKind::String,
            Self::StringList(_) => SettingsKind::StringList,
            Self::Map(_) => SettingsKind::VariantMap,
            Self::Color(_) => SettingsKind::Color,
        }
    }

    /// Interpret as a boolean.
    ///
    /// Coerces integers (`0`/non-zero) and the strings `"true"`, `"false"`,
    /// `"1"`, `"0"` (case-insensitive).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret as a 64-bit integer.
    ///
    /// Coerces booleans, integral doubles, and numeric strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Double(d) => {
                if d.fract() == 0.0 && d.is_finite() && *d >= i64::MIN as f64 && *d <= i64::MAX as f64 {
                    Some(*d as i64)
                } else {
                    None
                }
            }
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret as a 64-bit float.
    ///
    /// Coerces integers and numeric strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as an owned string.
    ///
    /// Scalars and colors render through their display form; lists and maps
    /// do not coerce.
    pub fn as_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Bool(_) | Self::Int(_) | Self::Double(_) | Self::Color(_) => {
                Some(self.to_string())
            }
            Self::StringList(_) | Self::Map(_) => None,
        }
    }

    /// Interpret as a string list.
    ///
    /// A single string coerces to a one-element list.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            Self::StringList(list) => Some(list.clone()),
            Self::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }

    /// Borrow the map value, if this is a map.
    pub fn as_map(&self) -> Option<&VariantMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Interpret as a color.
    ///
    /// Coerces hex strings.
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            Self::String(s) => Color::from_hex(s),
            _ => None,
        }
    }
}

impl fmt::Display for SettingsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => f.write_str(s),
            Self::StringList(list) => write!(f, "[{}]", list.join(", ")),
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Color(c) => write!(f, "{c}"),
        }
    }
}

impl From<bool> for SettingsValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SettingsValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SettingsValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for SettingsValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for SettingsValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SettingsValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for SettingsValue {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}

impl From<VariantMap> for SettingsValue {
    fn from(value: VariantMap) -> Self {
        Self::Map(value)
    }
}

impl From<Color> for SettingsValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_coercions() {
        assert_eq!(SettingsValue::Bool(true).as_bool(), Some(true));
        assert_eq!(SettingsValue::Int(0).as_bool(), Some(false));
        assert_eq!(SettingsValue::Int(7).as_bool(), Some(true));
        assert_eq!(SettingsValue::from("TRUE").as_bool(), Some(true));
        assert_eq!(SettingsValue::from(" 0 ").as_bool(), Some(false));
        assert_eq!(SettingsValue::from("maybe").as_bool(), None);
        assert_eq!(SettingsValue::Double(1.0).as_bool(), None);
    }

    #[test]
    fn integer_coercions() {
        assert_eq!(SettingsValue::Int(42).as_i64(), Some(42));
        assert_eq!(SettingsValue::Bool(true).as_i64(), Some(1));
        assert_eq!(SettingsValue::Double(3.0).as_i64(), Some(3));
        assert_eq!(SettingsValue::Double(3.5).as_i64(), None);
        assert_eq!(SettingsValue::from("17").as_i64(), Some(17));
        assert_eq!(SettingsValue::from("seventeen").as_i64(), None);
    }

    #[test]
    fn double_coercions() {
        assert_eq!(SettingsValue::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(SettingsValue::Int(2).as_f64(), Some(2.0));
        assert_eq!(SettingsValue::from("2.25").as_f64(), Some(2.25));
    }

    #[test]
    fn string_coercions() {
        assert_eq!(SettingsValue::from("abc").as_string(), Some("abc".to_string()));
        assert_eq!(SettingsValue::Int(5).as_string(), Some("5".to_string()));
        assert_eq!(
            SettingsValue::Color(Color::RED).as_string(),
            Some("#ff0000".to_string())
        );
        assert_eq!(SettingsValue::StringList(vec![]).as_string(), None);
    }

    #[test]
    fn string_list_coercions() {
        let list = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            SettingsValue::StringList(list.clone()).as_string_list(),
            Some(list)
        );
        assert_eq!(
            SettingsValue::from("solo").as_string_list(),
            Some(vec!["solo".to_string()])
        );
        assert_eq!(SettingsValue::Int(1).as_string_list(), None);
    }

    #[test]
    fn color_coercions() {
        assert_eq!(SettingsValue::Color(Color::BLUE).as_color(), Some(Color::BLUE));
        assert_eq!(SettingsValue::from("#0000ff").as_color(), Some(Color::BLUE));
        assert_eq!(SettingsValue::from("not a color").as_color(), None);
    }

    #[test]
    fn kind_reports_variant() {
        assert_eq!(SettingsValue::Bool(true).kind(), SettingsKind::Bool);
        assert_eq!(SettingsValue::Map(VariantMap::new()).kind(), SettingsKind::VariantMap);
    }
}
