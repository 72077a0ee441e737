use std::fmt;
use std::str::FromStr;

use palette::Srgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An 8-bit RGB triple.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Truncate a normalized (0..1 per channel) centroid to 8-bit channels.
    ///
    /// Each channel is scaled by 255, clamped to the valid range and then
    /// truncated towards zero, never rounded.
    pub fn from_centroid(c: Srgb<f32>) -> Self {
        let channel = |v: f32| (v * 255.0).clamp(0.0, 255.0) as u8;
        Self::new(channel(c.red), channel(c.green), channel(c.blue))
    }

    pub fn to_srgb(self) -> Srgb<f32> {
        Srgb::new(self.r, self.g, self.b).into_format::<f32>()
    }

    pub fn to_hex(self) -> String {
        rgb_to_hex(self)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Encode a color as `#rrggbb` with lowercase, zero-padded digits.
pub fn rgb_to_hex(rgb: Rgb) -> String {
    rgb.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHexError {
    #[error("hex color {0:?} must have exactly 6 digits")]
    Length(String),
    #[error("hex color {0:?} contains a non-hex digit")]
    Digit(String),
}

/// Parse `#rrggbb` (the `#` is optional, digits may be either case).
pub fn hex_to_rgb(s: &str) -> Result<Rgb, ParseHexError> {
    let hex = s.trim().trim_start_matches('#');
    // from_str_radix accepts a leading '+', so check the digits up front
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(ParseHexError::Length(s.to_string()));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseHexError::Digit(s.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseHexError::Digit(s.to_string()))
    };
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

impl FromStr for Rgb {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex_to_rgb(s)
    }
}
