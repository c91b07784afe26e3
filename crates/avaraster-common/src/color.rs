//! RGBA colors parsed from hex strings.

use crate::GeoError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (0 = fully transparent).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black, the initial value of every raster pixel.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#RRGGBB` (opaque) or `#AARRGGBB`.
    pub fn from_hex(hex: &str) -> Result<Self, GeoError> {
        let invalid = || GeoError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        let [b3, b2, b1, b0] = value.to_be_bytes();

        match digits.len() {
            6 => Ok(Self::opaque(b2, b1, b0)),
            8 => Ok(Self::new(b2, b1, b0, b3)),
            _ => Err(invalid()),
        }
    }

    /// Channels in `[r, g, b, a]` order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// True when the alpha channel is zero.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl FromStr for Rgba {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(Rgba::from_hex("#FF0000").unwrap(), Rgba::opaque(255, 0, 0));
        assert_eq!(Rgba::from_hex("#ff9900").unwrap(), Rgba::opaque(255, 153, 0));
        assert_eq!(Rgba::from_hex("#CCFF66").unwrap(), Rgba::opaque(204, 255, 102));
    }

    #[test]
    fn test_parse_argb() {
        assert_eq!(Rgba::from_hex("#80FF0000").unwrap(), Rgba::new(255, 0, 0, 128));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Rgba::from_hex("FF0000").is_err());
        assert!(Rgba::from_hex("#FF00").is_err());
        assert!(Rgba::from_hex("#GG0000").is_err());
        assert!(Rgba::from_hex("#+F0000").is_err());
        assert!(Rgba::from_hex("").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let opaque = Rgba::opaque(0x33, 0, 0);
        assert_eq!(opaque.to_string(), "#330000");
        let translucent = Rgba::new(1, 2, 3, 4);
        assert_eq!(translucent.to_string(), "#04010203");
        assert_eq!(Rgba::from_hex(&translucent.to_string()).unwrap(), translucent);
    }

    #[test]
    fn test_transparent() {
        assert!(Rgba::TRANSPARENT.is_transparent());
        assert!(!Rgba::opaque(0, 0, 0).is_transparent());
        assert_eq!(Rgba::default(), Rgba::TRANSPARENT);
    }
}
