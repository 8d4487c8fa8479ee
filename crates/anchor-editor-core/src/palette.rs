//! Signer colour assignment
//!
//! Colours are derived from a signer's ordinal position in the signer list,
//! never from its id, so the same list order always yields the same colours.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AnchorError;
use crate::signer::{ordinal_of, Signer, SignerId};

/// An sRGB colour, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = AnchorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AnchorError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Default palette: blue, green, purple, orange, pink, teal
pub const DEFAULT_COLORS: [Color; 6] = [
    Color::rgb(0x3b, 0x82, 0xf6),
    Color::rgb(0x22, 0xc5, 0x5e),
    Color::rgb(0xa8, 0x55, 0xf7),
    Color::rgb(0xf9, 0x73, 0x16),
    Color::rgb(0xec, 0x48, 0x99),
    Color::rgb(0x14, 0xb8, 0xa6),
];

/// Colour shown for anchors that are not bound to any signer
pub const UNBOUND_COLOR: Color = Color::rgb(0x6b, 0x72, 0x80);

/// Fixed, ordered list of visually distinct colours
#[derive(Debug, Clone, PartialEq)]
pub struct SignerPalette {
    colors: Vec<Color>,
}

impl Default for SignerPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.to_vec(),
        }
    }
}

impl SignerPalette {
    /// Build a palette from a custom colour list. An empty list falls back
    /// to the default palette.
    pub fn new(colors: Vec<Color>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour for the signer at `ordinal` in the signer list
    pub fn color_for(&self, ordinal: usize) -> Color {
        self.colors[ordinal % self.colors.len()]
    }

    /// Colour for a signer id, looked up by its position in `signers`.
    /// Unbound anchors and unknown ids get [`UNBOUND_COLOR`].
    pub fn color_for_signer(&self, signers: &[Signer], signer_id: Option<SignerId>) -> Color {
        signer_id
            .and_then(|id| ordinal_of(signers, id))
            .map(|ordinal| self.color_for(ordinal))
            .unwrap_or(UNBOUND_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::SignerStatus;

    fn signer(id: u64, name: &str) -> Signer {
        Signer {
            id: SignerId(id),
            display_name: name.to_string(),
            status: SignerStatus::Pending,
        }
    }

    #[test]
    fn test_color_for_wraps_around() {
        let palette = SignerPalette::default();
        assert_eq!(palette.color_for(0), palette.color_for(6));
        assert_eq!(palette.color_for(5), palette.color_for(11));
        assert_ne!(palette.color_for(0), palette.color_for(1));
    }

    #[test]
    fn test_three_signers_get_distinct_stable_colors() {
        let palette = SignerPalette::default();
        let signers = vec![signer(10, "A"), signer(20, "B"), signer(30, "C")];

        let colors: Vec<Color> = signers
            .iter()
            .map(|s| palette.color_for_signer(&signers, Some(s.id)))
            .collect();

        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);

        // Same order, same colours
        let again = palette.color_for_signer(&signers, Some(SignerId(20)));
        assert_eq!(again, colors[1]);
    }

    #[test]
    fn test_color_depends_on_position_not_id() {
        let palette = SignerPalette::default();
        let a = vec![signer(999, "A")];
        let b = vec![signer(1, "B")];
        assert_eq!(
            palette.color_for_signer(&a, Some(SignerId(999))),
            palette.color_for_signer(&b, Some(SignerId(1)))
        );
    }

    #[test]
    fn test_unbound_and_unknown_use_neutral_color() {
        let palette = SignerPalette::default();
        let signers = vec![signer(1, "A")];
        assert_eq!(palette.color_for_signer(&signers, None), UNBOUND_COLOR);
        assert_eq!(
            palette.color_for_signer(&signers, Some(SignerId(2))),
            UNBOUND_COLOR
        );
    }

    #[test]
    fn test_color_hex_parsing() {
        let c: Color = "#3B82F6".parse().unwrap();
        assert_eq!(c, DEFAULT_COLORS[0]);
        assert_eq!(c.to_hex(), "#3b82f6");

        assert!("3b82f6".parse::<Color>().is_err());
        assert!("#3b82f".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
        assert!("#ããã".parse::<Color>().is_err());
        assert!("#+1+2+3".parse::<Color>().is_err());
        assert!("#-1-2-3".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serializes_as_hex_string() {
        let json = serde_json::to_string(&DEFAULT_COLORS[1]).unwrap();
        assert_eq!(json, "\"#22c55e\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DEFAULT_COLORS[1]);
    }

    #[test]
    fn test_empty_custom_palette_falls_back() {
        assert_eq!(SignerPalette::new(vec![]), SignerPalette::default());
    }
}
