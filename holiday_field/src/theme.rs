//! Colour themes.
//!
//! A theme only moves colour targets; the rendered colour eases toward the
//! target a little every frame so a theme switch fades rather than snaps.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

/// Per-frame easing toward the leaf colours.
pub const LEAF_TINT_LERP: f32 = 0.05;
/// Per-frame easing toward the star-topper colours.
pub const STAR_TINT_LERP: f32 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Pink,
    Gold,
    Blue,
    Purple,
}

impl ColorTheme {
    pub const ALL: [ColorTheme; 4] = [Self::Pink, Self::Gold, Self::Blue, Self::Purple];

    /// Pink → Gold → Blue → Purple → Pink.
    pub fn next(self) -> Self {
        match self {
            Self::Pink => Self::Gold,
            Self::Gold => Self::Blue,
            Self::Blue => Self::Purple,
            Self::Purple => Self::Pink,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Gold => "gold",
            Self::Blue => "blue",
            Self::Purple => "purple",
        }
    }

    /// Base and emissive colour for the foliage.
    pub fn leaf_palette(self) -> Palette {
        match self {
            Self::Pink => Palette::from_hex(0xFFD1DC, 0xFFB2D0),
            Self::Gold => Palette::from_hex(0xFFD700, 0xFFA500),
            Self::Blue => Palette::from_hex(0x00F0FF, 0x0066FF),
            Self::Purple => Palette::from_hex(0xBD00FF, 0x6600FF),
        }
    }

    /// Colours for the star on top; pink keeps a white star.
    pub fn star_palette(self) -> Palette {
        match self {
            Self::Pink => Palette::from_hex(0xFFFFFF, 0xFFB6C1),
            other => other.leaf_palette(),
        }
    }
}

impl fmt::Display for ColorTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme `{0}` (expected pink, gold, blue or purple)")]
pub struct UnknownTheme(pub String);

impl FromStr for ColorTheme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Palette / Tint
// ════════════════════════════════════════════════════════════════════════════

/// Linear RGB pair, components 0–1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub base:     Vec3,
    pub emissive: Vec3,
}

impl Palette {
    pub fn from_hex(base: u32, emissive: u32) -> Self {
        Palette { base: hex_rgb(base), emissive: hex_rgb(emissive) }
    }
}

fn hex_rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

/// A colour that chases a palette target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub current: Palette,
    lerp:        f32,
}

impl Tint {
    pub fn new(start: Palette, lerp: f32) -> Self {
        Tint { current: start, lerp }
    }

    pub fn ease_toward(&mut self, target: Palette) {
        self.current.base = self.current.base.lerp(target.base, self.lerp);
        self.current.emissive = self.current.emissive.lerp(target.emissive, self.lerp);
    }
}

/// Pack a 0–1 RGB colour as opaque ARGB.
pub fn to_argb(rgb: Vec3) -> u32 {
    let c = (rgb.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    0xFF00_0000 | ((c.x as u32) << 16) | ((c.y as u32) << 8) | c.z as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_theme() {
        let mut t = ColorTheme::Pink;
        let mut seen = vec![t];
        for _ in 0..3 {
            t = t.next();
            seen.push(t);
        }
        assert_eq!(seen, ColorTheme::ALL.to_vec());
        assert_eq!(t.next(), ColorTheme::Pink);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("GOLD".parse::<ColorTheme>(), Ok(ColorTheme::Gold));
        assert!("teal".parse::<ColorTheme>().is_err());
    }

    #[test]
    fn unknown_theme_is_a_std_error() {
        let err: Box<dyn std::error::Error> = Box::new("teal".parse::<ColorTheme>().unwrap_err());
        assert_eq!(err.to_string(), "unknown theme `teal` (expected pink, gold, blue or purple)");
    }

    #[test]
    fn tint_converges_on_target() {
        let mut tint = Tint::new(ColorTheme::Pink.leaf_palette(), LEAF_TINT_LERP);
        let target = ColorTheme::Blue.leaf_palette();
        for _ in 0..400 {
            tint.ease_toward(target);
        }
        assert!(tint.current.base.distance(target.base) < 1e-3);
    }

    #[test]
    fn argb_packs_white() {
        assert_eq!(to_argb(Vec3::ONE), 0xFFFF_FFFF);
        assert_eq!(to_argb(hex_rgb(0xFFD700)), 0xFFFF_D700);
    }
}
