//! Color values for settings storage.

use std::fmt;

/// An RGBA color with 8-bit components.
///
/// Components are stored non-premultiplied so that colors round-trip exactly
/// through the settings store. The canonical string form is a hex string
/// (`#rrggbb`, or `#rrggbbaa` when the alpha channel is not opaque), which is
/// also what [`crate::SettingsValue::as_color`] accepts when coercing from a
/// stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
    /// Alpha component (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Create a color from 8-bit RGBA components.
    #[inline]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color from 8-bit RGB components.
    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color from a hex string (e.g. `"#ff0000"` or `"#ff0000cc"`).
    ///
    /// The leading `#` is optional. Returns `None` for anything that is not
    /// a 6- or 8-digit hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let len = hex.len();

        if len != 6 && len != 8 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        let a = if len == 8 {
            u8::from_str_radix(&hex[6..8], 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }

    /// Format as a hex string.
    ///
    /// Produces `#rrggbb` for opaque colors and `#rrggbbaa` otherwise.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    // Common colors
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgb8(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::from_rgb8(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::from_rgb8(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::from_rgb8(0, 255, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::from_rgb8(0, 0, 255);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let color = Color::from_rgba8(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.to_hex(), "#12345678");
        assert_eq!(Color::from_hex("#12345678"), Some(color));

        let opaque = Color::from_rgb8(0xab, 0xcd, 0xef);
        assert_eq!(opaque.to_hex(), "#abcdef");
        assert_eq!(Color::from_hex("abcdef"), Some(opaque));
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gggggg"), None);
        assert_eq!(Color::from_hex("#aabbccddee"), None);
    }

    #[test]
    fn display_matches_hex() {
        assert_eq!(Color::RED.to_string(), "#ff0000");
        assert_eq!(Color::TRANSPARENT.to_string(), "#00000000");
    }
}
