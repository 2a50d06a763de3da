//! 8-level hydration color palette
//!
//! Reference colors run from level 1 (palest) to level 8 (darkest).
//! Matching uses plain Euclidean distance in RGB space.

use serde::Serialize;
use utoipa::ToSchema;

/// RGB color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Hex string in `#RRGGBB` form
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Mean color with fractional channels, as produced by averaging pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct MeanColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl MeanColor {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Euclidean distance to a reference color
    #[inline]
    pub fn distance(&self, other: Rgb) -> f64 {
        let dr = self.r - other.r as f64;
        let dg = self.g - other.g as f64;
        let db = self.b - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// Nearest displayable color (channels rounded half away from zero)
    pub fn rounded(&self) -> Rgb {
        let channel = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

impl From<Rgb> for MeanColor {
    fn from(c: Rgb) -> Self {
        Self::new(c.r as f64, c.g as f64, c.b as f64)
    }
}

/// One reference entry of the hydration palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaletteEntry {
    /// Hydration level, 1 (palest) to 8 (darkest)
    pub level: u8,
    pub label: &'static str,
    pub reference: Rgb,
}

impl PaletteEntry {
    const fn new(level: u8, label: &'static str, reference: Rgb) -> Self {
        Self {
            level,
            label,
            reference,
        }
    }
}

/// Reference palette, ordered by increasing darkness
pub static PALETTE: [PaletteEntry; 8] = [
    PaletteEntry::new(1, "Very pale", Rgb::new(0xFF, 0xFD, 0xF2)),
    PaletteEntry::new(2, "Pale straw", Rgb::new(0xFF, 0xF6, 0xC9)),
    PaletteEntry::new(3, "Light yellow", Rgb::new(0xFF, 0xE9, 0x93)),
    PaletteEntry::new(4, "Yellow", Rgb::new(0xFF, 0xD3, 0x5C)),
    PaletteEntry::new(5, "Dark yellow", Rgb::new(0xFF, 0xB9, 0x3A)),
    PaletteEntry::new(6, "Amber", Rgb::new(0xF3, 0x9A, 0x1F)),
    PaletteEntry::new(7, "Dark amber", Rgb::new(0xD9, 0x7D, 0x12)),
    PaletteEntry::new(8, "Very dark amber", Rgb::new(0xB4, 0x5E, 0x0C)),
];

/// A palette entry together with its distance from the sampled color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RankedEntry {
    pub level: u8,
    pub label: &'static str,
    pub reference: Rgb,
    pub distance: f64,
}

/// Rank every palette entry by distance from `color`.
///
/// Ascending by distance; equal distances keep the lower level first.
pub fn rank(color: &MeanColor) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = PALETTE
        .iter()
        .map(|entry| RankedEntry {
            level: entry.level,
            label: entry.label,
            reference: entry.reference,
            distance: color.distance(entry.reference),
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.level.cmp(&b.level))
    });

    ranked
}

/// Confidence from the gap between the two closest entries, divided by
/// `scale` and clamped to 0..1.
///
/// A single-entry ranking has no competitor, so its gap is taken as zero.
pub fn confidence(ranking: &[RankedEntry], scale: f64) -> f64 {
    let gap = match ranking {
        [best, second, ..] => second.distance - best.distance,
        _ => 0.0,
    };
    (gap / scale).clamp(0.0, 1.0)
}
