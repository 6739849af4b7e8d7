use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A straight-alpha RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 is opaque.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgb(255, 0, 0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse "#RRGGBB" or "#RRGGBBAA", with or without the leading hash.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 && digits.len() != 8 {
            return Err(Error::Invalid(format!(
                "hex color needs 6 or 8 digits, got {hex:?}"
            )));
        }
        let byte = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| Error::Invalid(format!("bad hex color {hex:?}")))
        };
        let a = if digits.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Is this color fully transparent?
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex() -> Result<()> {
        let cases = [
            ("#FF0000", Color::RED),
            ("ffffff", Color::WHITE),
            ("#12345680", Color::rgba(0x12, 0x34, 0x56, 0x80)),
        ];
        for (input, expected) in cases {
            assert_eq!(Color::from_hex(input)?, expected, "input {input}");
        }
        Ok(())
    }

    #[test]
    fn parse_hex_rejects_garbage() {
        assert!(Color::from_hex("#FFF").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
        assert!(Color::from_hex("#ÿÿÿ").is_err());
    }
}
