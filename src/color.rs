//! RGBA colors written the way stylesheets write them.
//!
//! Configuration files carry colors as CSS strings (`"rgba(168,85,247,0.95)"`,
//! `"#a855f7"`), the renderer works with normalized floats.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::ColorError;

/// A straight-alpha color with every channel in `0.0..=1.0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from 8-bit channels and a float alpha, as in `rgba(168,85,247,0.95)`.
    pub fn from_rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a.clamp(0.0, 1.0),
        )
    }

    /// Parse `rgb(...)`, `rgba(...)`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ColorError::Malformed(input.to_string()));
        }

        let (body, expect_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(ColorError::Malformed(input.to_string()));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| ColorError::Malformed(input.to_string()))?;

        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != if expect_alpha { 4 } else { 3 } {
            return Err(ColorError::Malformed(input.to_string()));
        }

        let mut channels = [0u8; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            let value: f32 = part
                .parse()
                .map_err(|_| ColorError::OutOfRange(input.to_string()))?;
            if !(0.0..=255.0).contains(&value) {
                return Err(ColorError::OutOfRange(input.to_string()));
            }
            *slot = value.round() as u8;
        }

        let alpha = match parts.get(3) {
            Some(part) => {
                let a: f32 = part
                    .parse()
                    .map_err(|_| ColorError::OutOfRange(input.to_string()))?;
                if !(0.0..=1.0).contains(&a) {
                    return Err(ColorError::OutOfRange(input.to_string()));
                }
                a
            }
            None => 1.0,
        };

        Ok(Self::from_rgb8(channels[0], channels[1], channels[2], alpha))
    }

    /// Same color, different alpha.
    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Multiply the alpha channel.
    #[inline]
    pub fn scale_alpha(self, factor: f32) -> Self {
        self.with_alpha(self.a * factor)
    }

    /// Linear interpolation between two colors (all four channels).
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let alpha = if hex.len() == 8 {
        byte(6)? as f32 / 255.0
    } else {
        1.0
    };
    Some(Rgba::from_rgb8(byte(0)?, byte(2)?, byte(4)?, alpha))
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(
            f,
            "rgba({},{},{},{})",
            c(self.r),
            c(self.g),
            c(self.b),
            (self.a * 1000.0).round() / 1000.0
        )
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse(&value)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgba() {
        let c = Rgba::parse("rgba(168,85,247,0.95)").unwrap();
        assert!((c.r - 168.0 / 255.0).abs() < 1e-6);
        assert!((c.g - 85.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 247.0 / 255.0).abs() < 1e-6);
        assert!((c.a - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rgb_and_hex() {
        let rgb = Rgba::parse("rgb( 255, 255, 255 )").unwrap();
        assert_eq!(rgb, Rgba::WHITE);

        let hex = Rgba::parse("#a855f7").unwrap();
        assert_eq!(hex, Rgba::from_rgb8(0xa8, 0x55, 0xf7, 1.0));

        let hex_alpha = Rgba::parse("#ffffff00").unwrap();
        assert_eq!(hex_alpha.a, 0.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Rgba::parse("purple"), Err(ColorError::Malformed(_))));
        assert!(matches!(Rgba::parse("rgba(1,2,3)"), Err(ColorError::Malformed(_))));
        assert!(matches!(Rgba::parse("rgb(300,0,0)"), Err(ColorError::OutOfRange(_))));
        assert!(matches!(Rgba::parse("rgba(0,0,0,1.5)"), Err(ColorError::OutOfRange(_))));
        assert!(matches!(Rgba::parse("#12345"), Err(ColorError::Malformed(_))));
    }

    #[test]
    fn test_display_parses_back() {
        let c = Rgba::parse("rgba(115,99,255,0.14)").unwrap();
        assert_eq!(c.to_string(), "rgba(115,99,255,0.14)");
        assert_eq!(Rgba::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn test_alpha_helpers() {
        let c = Rgba::WHITE.with_alpha(0.5).scale_alpha(0.5);
        assert!((c.a - 0.25).abs() < 1e-6);
        assert_eq!(Rgba::WHITE.with_alpha(2.0).a, 1.0);

        let mid = Rgba::TRANSPARENT.lerp(Rgba::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.a - 0.5).abs() < 1e-6);
    }
}
