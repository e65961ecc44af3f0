//! Element style attributes.

use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGBA8 color that serializes as a CSS hex string.
///
/// Fully transparent colors serialize as `"transparent"`, which is how a
/// missing fill travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }
        let hex = value.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
                Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        match self.a {
            0 => "transparent".to_string(),
            255 => format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            a => format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, a),
        }
    }
}

impl Serialize for SerializableColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SerializableColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color: {value}")))
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke dash style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern in canvas units; empty for solid strokes.
    pub fn dash_pattern(&self) -> &'static [f64] {
        match self {
            StrokeStyle::Solid => &[],
            StrokeStyle::Dashed => &[5.0, 5.0],
            StrokeStyle::Dotted => &[2.0, 3.0],
        }
    }
}

/// Style attributes shared by every element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub stroke_color: SerializableColor,
    /// `transparent` means no fill.
    #[serde(default = "SerializableColor::transparent")]
    pub fill_color: SerializableColor,
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Render outlines with the hand-drawn effect.
    #[serde(default = "default_sketchy")]
    pub sketchy: bool,
    /// Use hachure lines instead of a solid fill.
    #[serde(default)]
    pub sketchy_fill: bool,
    #[serde(default = "default_roughness")]
    pub roughness: f64,
    /// Random seed for the hand-drawn effect (keeps jitter stable across redraws).
    #[serde(default = "generate_seed")]
    pub seed: u32,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_sketchy() -> bool {
    true
}

fn default_roughness() -> f64 {
    1.0
}

/// Generate a seed for a new element.
/// Counter mixed through a splitmix32 finalizer, so no clock or OS entropy is needed.
pub fn generate_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    splitmix32(counter.wrapping_mul(0x9E3779B9))
}

/// splitmix32 finalizer.
pub fn splitmix32(value: u32) -> u32 {
    let mut x = value;
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

impl ElementStyle {
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Fill color, or `None` when the fill is transparent.
    pub fn fill(&self) -> Option<Color> {
        if self.fill_color.is_transparent() {
            None
        } else {
            Some(self.fill_color.into())
        }
    }

    pub fn has_fill(&self) -> bool {
        !self.fill_color.is_transparent()
    }

    /// Whether outlines go through the hand-drawn effect.
    pub fn is_rough(&self) -> bool {
        self.sketchy && self.roughness > 0.0
    }
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            fill_color: SerializableColor::transparent(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            opacity: 1.0,
            sketchy: true,
            sketchy_fill: false,
            roughness: 1.0,
            seed: generate_seed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(SerializableColor::from_hex("#ff0000"), Some(SerializableColor::rgb(255, 0, 0)));
        assert_eq!(SerializableColor::from_hex("#0f0"), Some(SerializableColor::rgb(0, 255, 0)));
        assert_eq!(
            SerializableColor::from_hex("#11223380"),
            Some(SerializableColor::new(0x11, 0x22, 0x33, 0x80))
        );
        assert_eq!(SerializableColor::from_hex("transparent"), Some(SerializableColor::transparent()));
        assert_eq!(SerializableColor::from_hex("red"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
    }

    #[test]
    fn test_hex_output() {
        assert_eq!(SerializableColor::black().to_hex(), "#000000");
        assert_eq!(SerializableColor::new(1, 2, 3, 4).to_hex(), "#01020304");
        assert_eq!(SerializableColor::transparent().to_hex(), "transparent");
    }

    #[test]
    fn test_peniko_conversion() {
        let color = SerializableColor::rgb(10, 20, 30);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }

    #[test]
    fn test_default_style() {
        let style = ElementStyle::default();
        assert_eq!(style.stroke_color, SerializableColor::black());
        assert!(style.fill().is_none());
        assert!((style.stroke_width - 2.0).abs() < f64::EPSILON);
        assert!(style.sketchy);
        assert!(style.is_rough());
    }

    #[test]
    fn test_seeds_differ() {
        assert_ne!(generate_seed(), generate_seed());
    }

    #[test]
    fn test_dash_patterns() {
        assert!(StrokeStyle::Solid.dash_pattern().is_empty());
        assert_eq!(StrokeStyle::Dashed.dash_pattern(), &[5.0, 5.0]);
        assert_eq!(StrokeStyle::Dotted.dash_pattern(), &[2.0, 3.0]);
    }

    #[test]
    fn test_style_deserializes_with_defaults() {
        let style: ElementStyle =
            serde_json::from_str(r##"{"strokeColor":"#000000","strokeWidth":1}"##).unwrap();
        assert!(!style.has_fill());
        assert!((style.opacity - 1.0).abs() < f64::EPSILON);
        assert_eq!(style.stroke_style, StrokeStyle::Solid);
    }
}
