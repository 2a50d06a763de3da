//! Center-region sampling and robust color statistics
//!
//! Pixels in the sampling region are screened for glare, shadow and
//! colorless highlights; the survivors are reduced to a trimmed mean.

use serde::Serialize;
use utoipa::ToSchema;

use crate::palette::{MeanColor, Rgb};
use crate::raster::PixelBuffer;

/// Centered square sub-area of the working canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SamplingRegion {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

impl SamplingRegion {
    /// Center a square of `requested` pixels, shrunk to fit the canvas
    pub fn centered(canvas_width: u32, canvas_height: u32, requested: u32) -> Self {
        let size = requested.min(canvas_width).min(canvas_height);
        Self {
            x: (canvas_width - size) / 2,
            y: (canvas_height - size) / 2,
            size,
        }
    }

    /// Number of pixels inside the region
    pub fn area(&self) -> usize {
        self.size as usize * self.size as usize
    }

    /// Row-major pixel coordinates inside the region
    pub fn coordinates(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.y..self.y + self.size)
            .flat_map(move |y| (self.x..self.x + self.size).map(move |x| (x, y)))
    }
}

/// Screening thresholds and robust-statistics parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Brightness above this is glare
    pub glare_brightness: f64,
    /// Brightness below this is shadow
    pub shadow_brightness: f64,
    /// Bright pixels above this with low saturation are colorless highlights
    pub neutral_brightness: f64,
    pub neutral_saturation: f64,
    /// Minimum usable pixels for a classification
    pub min_usable_pixels: usize,
    /// Fraction trimmed from each brightness tail
    pub trim_fraction: f64,
    /// Distance gap between the two best matches that counts as full confidence
    pub confidence_scale: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            glare_brightness: 245.0,
            shadow_brightness: 25.0,
            neutral_brightness: 220.0,
            neutral_saturation: 0.08,
            min_usable_pixels: 50,
            trim_fraction: 0.15,
            confidence_scale: 40.0,
        }
    }
}

/// One examined pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub brightness: f64,
    pub saturation: f64,
}

impl PixelSample {
    pub fn new(color: Rgb) -> Self {
        let Rgb { r, g, b } = color;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let saturation = if max == 0 {
            0.0
        } else {
            (max - min) as f64 / max as f64
        };

        Self {
            r,
            g,
            b,
            brightness: channel_sum(r, g, b) as f64 / 3.0,
            saturation,
        }
    }

    /// Sort key: brightness first, then the color itself
    #[inline]
    fn order_key(&self) -> (u16, u8, u8, u8) {
        (channel_sum(self.r, self.g, self.b), self.r, self.g, self.b)
    }
}

#[inline]
fn channel_sum(r: u8, g: u8, b: u8) -> u16 {
    r as u16 + g as u16 + b as u16
}

/// Outcome of screening one pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Usable,
    Glare,
    Shadow,
    NeutralHighlight,
}

impl Thresholds {
    /// Screen one pixel. Checks run glare, shadow, then neutral highlight.
    pub fn screen(&self, sample: &PixelSample) -> Verdict {
        if sample.brightness > self.glare_brightness {
            Verdict::Glare
        } else if sample.brightness < self.shadow_brightness {
            Verdict::Shadow
        } else if sample.brightness > self.neutral_brightness
            && sample.saturation < self.neutral_saturation
        {
            Verdict::NeutralHighlight
        } else {
            Verdict::Usable
        }
    }

    /// Number of samples dropped from each tail for `n` usable pixels
    pub fn trim_count(&self, n: usize) -> usize {
        (n as f64 * self.trim_fraction).floor() as usize
    }
}

/// Per-cause rejection tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Rejections {
    pub glare: usize,
    pub shadow: usize,
    pub neutral_highlight: usize,
}

impl Rejections {
    pub fn total(&self) -> usize {
        self.glare + self.shadow + self.neutral_highlight
    }
}

/// Usable pixels of one region plus what was thrown away
#[derive(Debug, Clone, Default)]
pub struct RegionSamples {
    pub usable: Vec<PixelSample>,
    pub rejected: Rejections,
}

impl RegionSamples {
    pub fn sampled(&self) -> usize {
        self.usable.len() + self.rejected.total()
    }
}

/// Read and screen every pixel of `region`
pub fn collect(buffer: &PixelBuffer, region: &SamplingRegion, thresholds: &Thresholds) -> RegionSamples {
    let mut samples = RegionSamples {
        usable: Vec::with_capacity(region.area()),
        rejected: Rejections::default(),
    };

    for (x, y) in region.coordinates() {
        let sample = PixelSample::new(buffer.rgb(x, y));
        match thresholds.screen(&sample) {
            Verdict::Usable => samples.usable.push(sample),
            Verdict::Glare => samples.rejected.glare += 1,
            Verdict::Shadow => samples.rejected.shadow += 1,
            Verdict::NeutralHighlight => samples.rejected.neutral_highlight += 1,
        }
    }

    samples
}

/// Symmetric trimmed mean summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedMean {
    pub color: MeanColor,
    /// Mean brightness of the retained core
    pub brightness: f64,
    /// Mean saturation of the retained core
    pub saturation: f64,
    /// Pixels that survived trimming
    pub core_len: usize,
}

/// Trim `trim` samples from each brightness tail and average the rest.
///
/// Sorting is total over (brightness, r, g, b), so the result does not depend
/// on the order of `samples`. Returns `None` when nothing would remain.
pub fn trimmed_mean(samples: &mut [PixelSample], trim: usize) -> Option<TrimmedMean> {
    let n = samples.len();
    if n <= trim.saturating_mul(2) {
        return None;
    }

    samples.sort_unstable_by_key(PixelSample::order_key);
    let core = &samples[trim..n - trim];

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    let mut saturation = 0.0;
    for s in core {
        r += s.r as u64;
        g += s.g as u64;
        b += s.b as u64;
        saturation += s.saturation;
    }

    let len = core.len() as f64;
    let color = MeanColor::new(r as f64 / len, g as f64 / len, b as f64 / len);

    Some(TrimmedMean {
        color,
        brightness: (color.r + color.g + color.b) / 3.0,
        saturation: saturation / len,
        core_len: core.len(),
    })
}
