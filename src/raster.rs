//! Normalization of arbitrary photos into a fixed working canvas
//!
//! - Decode the source bytes (PNG or JPEG)
//! - Scale to fit inside the canvas, preserving aspect ratio
//! - Center on a cleared (transparent black) RGBA canvas

use crate::error::ClassifyError;
use crate::palette::Rgb;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Default working canvas width
pub const CANVAS_WIDTH: u32 = 520;

/// Default working canvas height
pub const CANVAS_HEIGHT: u32 = 360;

/// RGBA8 pixel buffer, row-major, stride `width * 4`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Cleared (transparent black) buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Buffer filled with a single opaque color
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([color.r, color.g, color.b, 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.image.width() as usize * 4
    }

    /// Color of a pixel; alpha is ignored
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> Rgb {
        let p = self.image.get_pixel(x, y);
        Rgb::new(p[0], p[1], p[2])
    }

    /// Paint one pixel opaque
    pub fn set_rgb(&mut self, x: u32, y: u32, color: Rgb) {
        self.image
            .put_pixel(x, y, Rgba([color.r, color.g, color.b, 255]));
    }

    /// Raw RGBA8 bytes
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Reset every pixel to transparent black
    pub fn clear(&mut self) {
        for p in self.image.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
    }
}

/// Where a scaled source image lands on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Uniform scale-to-fit, centered. Sizes and offsets are floored.
    pub fn contain(src_width: u32, src_height: u32, canvas_width: u32, canvas_height: u32) -> Self {
        let scale_x = canvas_width as f64 / src_width as f64;
        let scale_y = canvas_height as f64 / src_height as f64;
        let scale = scale_x.min(scale_y);

        let width = ((src_width as f64 * scale).floor() as u32).min(canvas_width);
        let height = ((src_height as f64 * scale).floor() as u32).min(canvas_height);

        Self {
            x: (canvas_width - width) / 2,
            y: (canvas_height - height) / 2,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Capability to turn encoded image bytes into a fixed-size pixel buffer
pub trait ImageDecoder: Send + Sync {
    fn decode_and_resize(
        &self,
        bytes: &[u8],
        target_width: u32,
        target_height: u32,
    ) -> Result<PixelBuffer, ClassifyError>;
}

/// Decoder backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDecoder;

impl ImageDecoder for NativeDecoder {
    fn decode_and_resize(
        &self,
        bytes: &[u8],
        target_width: u32,
        target_height: u32,
    ) -> Result<PixelBuffer, ClassifyError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ClassifyError::Decode(e.to_string()))?;

        let mut canvas = PixelBuffer::new(target_width, target_height);
        draw_contained(&mut canvas, &img)?;
        Ok(canvas)
    }
}

/// Scale `img` to fit `canvas` and draw it centered; the rest stays cleared
fn draw_contained(canvas: &mut PixelBuffer, img: &DynamicImage) -> Result<(), ClassifyError> {
    let (src_width, src_height) = img.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(ClassifyError::Decode(format!(
            "image has no pixels ({}x{})",
            src_width, src_height
        )));
    }

    let placement = Placement::contain(src_width, src_height, canvas.width(), canvas.height());
    tracing::debug!(
        "Placing {}x{} source at ({}, {}) as {}x{}",
        src_width,
        src_height,
        placement.x,
        placement.y,
        placement.width,
        placement.height
    );

    if placement.is_empty() {
        return Ok(());
    }

    // Triangle (bilinear) is close to what a browser canvas does on drawImage
    let scaled = img
        .resize_exact(
            placement.width,
            placement.height,
            imageops::FilterType::Triangle,
        )
        .to_rgba8();

    imageops::replace(
        &mut canvas.image,
        &scaled,
        placement.x as i64,
        placement.y as i64,
    );

    Ok(())
}

/// Decodes photos into the working canvas
pub struct Rasterizer<D = NativeDecoder> {
    decoder: D,
    width: u32,
    height: u32,
}

impl Rasterizer<NativeDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(NativeDecoder)
    }
}

impl Default for Rasterizer<NativeDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ImageDecoder> Rasterizer<D> {
    /// Use a custom decoder with the default canvas size
    pub fn with_decoder(decoder: D) -> Self {
        Self {
            decoder,
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        }
    }

    /// Override the working canvas size
    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Decode `bytes` into a fresh working canvas
    pub fn normalize(&self, bytes: &[u8]) -> Result<PixelBuffer, ClassifyError> {
        if bytes.is_empty() {
            return Err(ClassifyError::Decode("empty input".into()));
        }

        let buffer = self
            .decoder
            .decode_and_resize(bytes, self.width, self.height)?;

        if buffer.width() != self.width || buffer.height() != self.height {
            return Err(ClassifyError::Decode(format!(
                "decoder produced {}x{}, expected {}x{}",
                buffer.width(),
                buffer.height(),
                self.width,
                self.height
            )));
        }

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_contain_landscape_wider_than_canvas() {
        // 1040x360 halves to 520x180, centered vertically
        let p = Placement::contain(1040, 360, 520, 360);
        assert_eq!(p, Placement { x: 0, y: 90, width: 520, height: 180 });
    }

    #[test]
    fn test_contain_portrait() {
        // 260x720 halves to 130x360
        let p = Placement::contain(260, 720, 520, 360);
        assert_eq!(p, Placement { x: 195, y: 0, width: 130, height: 360 });
    }

    #[test]
    fn test_contain_upscales_small_images() {
        let p = Placement::contain(52, 36, 520, 360);
        assert_eq!(p, Placement { x: 0, y: 0, width: 520, height: 360 });
    }

    #[test]
    fn test_contain_degenerate_strip() {
        let p = Placement::contain(100_000, 1, 520, 360);
        assert_eq!(p.height, 0);
        assert!(p.is_empty());
    }

    #[test]
    fn test_normalize_fills_canvas_for_matching_aspect() {
        let src = RgbImage::from_pixel(1040, 720, image::Rgb([200, 120, 30]));
        let buffer = Rasterizer::new().normalize(&encode_png(&src)).unwrap();

        assert_eq!((buffer.width(), buffer.height()), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(buffer.stride(), CANVAS_WIDTH as usize * 4);
        assert_eq!(buffer.rgb(0, 0), Rgb::new(200, 120, 30));
        assert_eq!(buffer.rgb(260, 180), Rgb::new(200, 120, 30));
        assert_eq!(buffer.rgb(519, 359), Rgb::new(200, 120, 30));
    }

    #[test]
    fn test_normalize_letterboxes_with_cleared_background() {
        // Square source leaves side bars on a 520x360 canvas
        let src = RgbImage::from_pixel(100, 100, image::Rgb([240, 180, 60]));
        let buffer = Rasterizer::new().normalize(&encode_png(&src)).unwrap();

        assert_eq!(buffer.rgb(0, 180), Rgb::new(0, 0, 0));
        assert_eq!(buffer.as_raw()[(180 * buffer.stride()) + 3], 0);
        assert_eq!(buffer.rgb(260, 180), Rgb::new(240, 180, 60));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = Rasterizer::new().normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_normalize_rejects_empty_input() {
        let err = Rasterizer::new().normalize(&[]).unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_custom_canvas() {
        let src = RgbImage::from_pixel(10, 10, image::Rgb([1, 2, 3]));
        let rasterizer = Rasterizer::new().with_canvas(64, 32);
        let buffer = rasterizer.normalize(&encode_png(&src)).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (64, 32));
    }

    struct WrongSize;

    impl ImageDecoder for WrongSize {
        fn decode_and_resize(&self, _: &[u8], _: u32, _: u32) -> Result<PixelBuffer, ClassifyError> {
            Ok(PixelBuffer::new(1, 1))
        }
    }

    #[test]
    fn test_decoder_contract_enforced() {
        let err = Rasterizer::with_decoder(WrongSize).normalize(b"x").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)));
    }

    #[test]
    fn test_clear_resets_pixels() {
        let mut buffer = PixelBuffer::filled(4, 4, Rgb::new(9, 9, 9));
        buffer.clear();
        assert!(buffer.as_raw().iter().all(|&b| b == 0));
    }
}
