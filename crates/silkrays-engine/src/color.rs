//! Hex color <-> normalized RGB.
//!
//! Every color parameter crosses the UI/GPU boundary as a `#RRGGBB` string and is
//! uploaded as a `vec3` with channels in `[0, 1]`. [`HexColor`] is only constructible
//! from well-formed input, so code holding one can decode it infallibly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Normalized RGB triple, each channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Decode `#RRGGBB` into its three 8-bit channels.
pub fn decode_bytes(hex: &str) -> Result<[u8; 3], EngineError> {
    let malformed = || EngineError::MalformedColor { input: hex.to_string() };

    let digits = hex.strip_prefix('#').ok_or_else(malformed)?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| malformed());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Decode `#RRGGBB` into normalized channels (`value / 255`).
pub fn decode(hex: &str) -> Result<Rgb, EngineError> {
    let [r, g, b] = decode_bytes(hex)?;
    Ok(Rgb {
        r: r as f32 / 255.0,
        g: g as f32 / 255.0,
        b: b as f32 / 255.0,
    })
}

/// Encode normalized channels back to lowercase `#rrggbb`, quantizing to 8 bits.
pub fn encode(rgb: Rgb) -> String {
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", q(rgb.r), q(rgb.g), q(rgb.b))
}

/// A validated `#rrggbb` color string (stored lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        decode(s)?;
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Built-in constants that are known to be well-formed.
    pub(crate) fn known(s: &'static str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> Rgb {
        // Validated at construction.
        decode(&self.0).unwrap_or(Rgb { r: 0.0, g: 0.0, b: 0.0 })
    }

    pub fn bytes(&self) -> [u8; 3] {
        decode_bytes(&self.0).unwrap_or([0; 3])
    }
}

impl TryFrom<String> for HexColor {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HexColor::parse(&s)
    }
}

impl From<HexColor> for String {
    fn from(c: HexColor) -> Self {
        c.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_channels_over_255() {
        let c = decode("#0d1a33").unwrap();
        assert_eq!(c.r, 13.0 / 255.0);
        assert_eq!(c.g, 26.0 / 255.0);
        assert_eq!(c.b, 51.0 / 255.0);

        let white = decode("#FFFFFF").unwrap();
        assert_eq!(white.to_array(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn encode_inverts_decode_for_every_channel_value() {
        for v in 0u8..=255 {
            let hex = format!("#{v:02x}{:02x}{:02x}", 255 - v, v / 2);
            assert_eq!(encode(decode(&hex).unwrap()), hex);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "#", "#12345", "123456", "#12345g", "#1234567", "#ééé"] {
            assert!(
                matches!(decode(bad), Err(EngineError::MalformedColor { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hex_color_normalizes_case_and_deserializes_strictly() {
        let c: HexColor = serde_json::from_str("\"#B8FFF7\"").unwrap();
        assert_eq!(c.as_str(), "#b8fff7");
        assert!(serde_json::from_str::<HexColor>("\"b8fff7\"").is_err());
    }
}
