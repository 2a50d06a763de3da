//! Hydration level classification from a normalized pixel buffer
//!
//! 1. Pick the centered sampling region
//! 2. Screen pixels for glare, shadow and colorless highlights
//! 3. Trimmed mean of the usable pixels
//! 4. Rank against the reference palette and score the separation

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ClassifyError, ShortfallCause};
use crate::palette::{self, MeanColor, RankedEntry};
use crate::raster::PixelBuffer;
use crate::sampling::{self, Rejections, SamplingRegion, Thresholds};

/// Region size used when the caller does not ask for one
pub const DEFAULT_REGION_SIZE: u32 = 140;

/// Successful classification of one photo
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Classification {
    /// Best matching hydration level (1-8)
    pub level: u8,
    pub label: &'static str,
    /// Separation between the best and second-best match, 0.0 to 1.0
    pub confidence: f64,
    /// Pixels that passed screening (before trimming)
    pub usable_pixels: usize,
    pub mean_color: MeanColor,
    /// `mean_color` rounded, as `#RRGGBB`
    pub mean_hex: String,
    /// Mean brightness of the trimmed core
    pub brightness: f64,
    /// Mean saturation of the trimmed core
    pub saturation: f64,
    pub region: SamplingRegion,
    pub rejected: Rejections,
    /// All palette entries, closest first
    pub ranking: Vec<RankedEntry>,
}

/// Stateless classifier over a fixed set of thresholds
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Classify the centered region of `buffer`.
    ///
    /// `region_size` is clamped to the buffer dimensions.
    pub fn classify(
        &self,
        buffer: &PixelBuffer,
        region_size: u32,
    ) -> Result<Classification, ClassifyError> {
        let region = SamplingRegion::centered(buffer.width(), buffer.height(), region_size);
        let mut samples = sampling::collect(buffer, &region, &self.thresholds);
        let usable = samples.usable.len();
        let required = self.thresholds.min_usable_pixels;

        tracing::debug!(
            "Region {}px at ({}, {}): {} usable, {} glare, {} shadow, {} neutral",
            region.size,
            region.x,
            region.y,
            usable,
            samples.rejected.glare,
            samples.rejected.shadow,
            samples.rejected.neutral_highlight
        );

        let insufficient = || ClassifyError::InsufficientSamples {
            usable,
            sampled: region.area(),
            required,
            cause: shortfall_cause(&region, &samples.rejected, required),
        };

        if usable < required {
            return Err(insufficient());
        }

        let trim = self.thresholds.trim_count(usable);
        let rejected = samples.rejected;
        let mean = sampling::trimmed_mean(&mut samples.usable, trim).ok_or_else(insufficient)?;

        let ranking = palette::rank(&mean.color);
        let confidence = palette::confidence(&ranking, self.thresholds.confidence_scale);
        let best = ranking[0];

        Ok(Classification {
            level: best.level,
            label: best.label,
            confidence,
            usable_pixels: usable,
            mean_color: mean.color,
            mean_hex: mean.color.rounded().to_hex(),
            brightness: mean.brightness,
            saturation: mean.saturation,
            region,
            rejected,
            ranking,
        })
    }
}

/// Classify with the default thresholds
pub fn classify(buffer: &PixelBuffer, region_size: u32) -> Result<Classification, ClassifyError> {
    Classifier::default().classify(buffer, region_size)
}

/// Best guess at why a region came up short
fn shortfall_cause(region: &SamplingRegion, rejected: &Rejections, required: usize) -> ShortfallCause {
    if region.area() < required {
        return ShortfallCause::RegionTooSmall;
    }

    let mut cause = ShortfallCause::Glare;
    let mut most = rejected.glare;
    if rejected.shadow > most {
        cause = ShortfallCause::Shadow;
        most = rejected.shadow;
    }
    if rejected.neutral_highlight > most {
        cause = ShortfallCause::NeutralHighlight;
    }
    cause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{Rgb, PALETTE};

    fn uniform(color: Rgb) -> PixelBuffer {
        PixelBuffer::filled(520, 360, color)
    }

    #[test]
    fn test_exact_reference_colors() {
        // Level 1's reference averages 250 and is screened out as glare
        for entry in &PALETTE[1..] {
            let result = classify(&uniform(entry.reference), DEFAULT_REGION_SIZE).unwrap();
            assert_eq!(result.level, entry.level, "level {}", entry.level);
            assert_eq!(result.label, entry.label);
            assert_eq!(result.confidence, 1.0);
            assert_eq!(result.mean_color, MeanColor::from(entry.reference));
            assert_eq!(result.mean_hex, entry.reference.to_hex());
            assert_eq!(result.usable_pixels, 19_600);
            assert_eq!(result.ranking[0].distance, 0.0);
        }
    }

    #[test]
    fn test_level_one_reference_is_glare() {
        let err = classify(&uniform(PALETTE[0].reference), DEFAULT_REGION_SIZE).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::InsufficientSamples { usable: 0, cause: ShortfallCause::Glare, .. }
        ));
    }

    #[test]
    fn test_white_and_black_regions_fail() {
        let white = classify(&uniform(Rgb::new(255, 255, 255)), DEFAULT_REGION_SIZE).unwrap_err();
        assert!(matches!(
            white,
            ClassifyError::InsufficientSamples { cause: ShortfallCause::Glare, .. }
        ));

        let black = classify(&uniform(Rgb::new(0, 0, 0)), DEFAULT_REGION_SIZE).unwrap_err();
        assert!(matches!(
            black,
            ClassifyError::InsufficientSamples { cause: ShortfallCause::Shadow, .. }
        ));
    }

    #[test]
    fn test_colorless_region_fails_as_neutral() {
        let err = classify(&uniform(Rgb::new(232, 232, 230)), DEFAULT_REGION_SIZE).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::InsufficientSamples { cause: ShortfallCause::NeutralHighlight, .. }
        ));
    }

    #[test]
    fn test_tiny_region_fails_as_too_small() {
        // 7x7 = 49 pixels, one short of the minimum
        let err = classify(&uniform(PALETTE[4].reference), 7).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::InsufficientSamples {
                usable: 49,
                sampled: 49,
                cause: ShortfallCause::RegionTooSmall,
                ..
            }
        ));

        // 8x8 = 64 pixels is enough
        assert_eq!(classify(&uniform(PALETTE[4].reference), 8).unwrap().level, 5);
    }

    #[test]
    fn test_oversized_region_is_clamped() {
        let result = classify(&uniform(PALETTE[5].reference), u32::MAX).unwrap();
        assert_eq!(result.region, SamplingRegion { x: 80, y: 0, size: 360 });
        assert_eq!(result.usable_pixels, 360 * 360);
    }

    #[test]
    fn test_idempotent() {
        let mut buffer = uniform(PALETTE[3].reference);
        for i in 0..140 {
            buffer.set_rgb(190 + i, 110 + i, Rgb::new(250, 250, 250));
            buffer.set_rgb(190 + i, 120, Rgb::new(200, 140, 40));
        }
        let first = classify(&buffer, DEFAULT_REGION_SIZE).unwrap();
        let second = classify(&buffer, DEFAULT_REGION_SIZE).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_glare_streak_ignored() {
        let mut buffer = uniform(PALETTE[6].reference);
        for x in 190..330 {
            for y in 110..130 {
                buffer.set_rgb(x, y, Rgb::new(255, 255, 255));
            }
        }
        let result = classify(&buffer, DEFAULT_REGION_SIZE).unwrap();
        assert_eq!(result.level, 7);
        assert_eq!(result.rejected.glare, 140 * 20);
        assert_eq!(result.mean_color, MeanColor::from(PALETTE[6].reference));
    }

    #[test]
    fn test_ranking_covers_palette() {
        let result = classify(&uniform(Rgb::new(230, 160, 40)), DEFAULT_REGION_SIZE).unwrap();
        let mut levels: Vec<u8> = result.ranking.iter().map(|r| r.level).collect();
        assert_eq!(result.ranking[0].level, result.level);
        levels.sort_unstable();
        assert_eq!(levels, (1..=8).collect::<Vec<u8>>());
        assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            min_usable_pixels: 20_000,
            ..Thresholds::default()
        };
        let err = Classifier::new(thresholds)
            .classify(&uniform(PALETTE[4].reference), DEFAULT_REGION_SIZE)
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::InsufficientSamples { usable: 19_600, required: 20_000, .. }
        ));
    }

    #[test]
    fn test_confidence_scale_from_thresholds() {
        // Mean (240, 170, 45) sits between levels 5 and 6
        let buffer = uniform(Rgb::new(240, 170, 45));
        let standard = classify(&buffer, DEFAULT_REGION_SIZE).unwrap();
        let gap = standard.ranking[1].distance - standard.ranking[0].distance;
        assert_eq!(standard.confidence, (gap / 40.0).clamp(0.0, 1.0));

        let wide = Classifier::new(Thresholds {
            confidence_scale: 80.0,
            ..Thresholds::default()
        })
        .classify(&buffer, DEFAULT_REGION_SIZE)
        .unwrap();
        assert_eq!(wide.level, standard.level);
        assert_eq!(wide.confidence, (gap / 80.0).clamp(0.0, 1.0));
        assert!(wide.confidence < standard.confidence);
    }
}
