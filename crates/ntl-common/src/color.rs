//! Color primitives shared by the color scale engine and the overlay renderer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse "#RRGGBB" or "#RRGGBBAA" (leading '#' optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();

        match s.len() {
            6 => Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// "#rrggbb" hex notation (alpha is dropped).
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// CSS color string, `rgb(...)` when opaque and `rgba(...)` otherwise.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }

    /// Multiply the alpha channel by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * opacity).round() as u8,
            ..self
        }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_css())
    }
}

/// Color space in which a scale interpolates between palette stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Straight sRGB channel interpolation.
    Rgb,
    /// CIE L*a*b*.
    Lab,
    /// Cylindrical L*C*h (hue takes the shorter arc).
    #[default]
    Lch,
}

impl FromStr for InterpolationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(Self::Rgb),
            "lab" => Ok(Self::Lab),
            "lch" | "hcl" => Ok(Self::Lch),
            other => Err(format!("unknown interpolation mode: {}", other)),
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb => "rgb",
            Self::Lab => "lab",
            Self::Lch => "lch",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgba::from_hex("#FF5500"), Some(Rgba::opaque(255, 85, 0)));
        assert_eq!(Rgba::from_hex("00ff0080"), Some(Rgba::new(0, 255, 0, 128)));
        assert_eq!(Rgba::from_hex("#FFF"), None);
        assert_eq!(Rgba::from_hex("#GG0000"), None);
    }

    #[test]
    fn test_css_output() {
        assert_eq!(Rgba::opaque(1, 2, 3).to_css(), "rgb(1,2,3)");
        assert_eq!(Rgba::new(1, 2, 3, 0).to_css(), "rgba(1,2,3,0.000)");
        assert_eq!(Rgba::opaque(255, 16, 0).to_hex(), "#ff1000");
    }

    #[test]
    fn test_with_opacity() {
        assert_eq!(Rgba::opaque(10, 10, 10).with_opacity(0.5).a, 128);
        assert_eq!(Rgba::opaque(10, 10, 10).with_opacity(2.0).a, 255);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("LCH".parse::<InterpolationMode>().unwrap(), InterpolationMode::Lch);
        assert_eq!("hcl".parse::<InterpolationMode>().unwrap(), InterpolationMode::Lch);
        assert_eq!("rgb".parse::<InterpolationMode>().unwrap(), InterpolationMode::Rgb);
        assert!("hsv".parse::<InterpolationMode>().is_err());
    }
}
