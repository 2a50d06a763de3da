//! # Hydration color
//!
//! Estimates a urine hydration color level (1 = very pale, 8 = very dark
//! amber) from a photo.
//!
//! The photo is fitted into a 520x360 working canvas, a centered square is
//! sampled, glare/shadow/colorless pixels are dropped, and the trimmed-mean
//! color is matched against an 8-entry reference palette.
//!
//! ## Example
//!
//! ```rust,no_run
//! let bytes = std::fs::read("sample.jpg")?;
//! let result = hydration_color::analyze_photo(&bytes, 140)?;
//! println!("Level {} ({}), confidence {:.2}", result.level, result.label, result.confidence);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod palette;
pub mod raster;
pub mod sampling;

pub use classifier::{classify, Classification, Classifier, DEFAULT_REGION_SIZE};
pub use error::{ClassifyError, ShortfallCause};
pub use palette::{PaletteEntry, Rgb, PALETTE};
pub use raster::{ImageDecoder, NativeDecoder, PixelBuffer, Rasterizer};
pub use sampling::{SamplingRegion, Thresholds};

/// Decode a photo and classify its centered region with default settings
pub fn analyze_photo(bytes: &[u8], region_size: u32) -> Result<Classification, ClassifyError> {
    let buffer = Rasterizer::new().normalize(bytes)?;
    classify(&buffer, region_size)
}
