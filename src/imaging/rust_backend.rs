//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only, no full decode) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::load_from_memory` |
//! | Crop | `image::DynamicImage::crop_imm`, re-encoded as PNG so no quality is lost |
//! | Resize | `image::DynamicImage::resize_to_fill` with `Lanczos3` filter |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha dropped) |

use super::backend::{BackendError, ImageBackend, ImageMetadata};
use super::params::{AbsoluteRegion, OutputFormat, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an image held in memory, guessing the format from its magic bytes.
fn load_image(data: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(data)
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode image: {}", e)))
}

/// Encode a DynamicImage in the requested output format.
fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u32,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => img
            .write_with_encoder(PngEncoder::new(&mut buf))
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?,
        OutputFormat::Jpg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality as u8))
                .map_err(|e| {
                    BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e))
                })?
        }
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, data: &[u8]) -> Result<ImageMetadata, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(ImageMetadata { width, height })
    }

    fn crop(&self, data: &[u8], region: &AbsoluteRegion) -> Result<Vec<u8>, BackendError> {
        let img = load_image(data)?;
        let fits = region.width > 0
            && region.height > 0
            && region.left as u64 + region.width as u64 <= img.width() as u64
            && region.top as u64 + region.height as u64 <= img.height() as u64;
        if !fits {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {}x{}+{}+{} outside {}x{} image",
                region.width,
                region.height,
                region.left,
                region.top,
                img.width(),
                img.height()
            )));
        }
        let cropped = img.crop_imm(region.left, region.top, region.width, region.height);
        encode_image(&cropped, OutputFormat::Png, 100)
    }

    fn resize_and_encode(
        &self,
        data: &[u8],
        params: &ResizeParams,
    ) -> Result<Vec<u8>, BackendError> {
        let img = load_image(data)?;

        // Fill-resize then center-crop to exact dimensions
        let filled = img.resize_to_fill(params.width, params.height, FilterType::Lanczos3);
        encode_image(&filled, params.format, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG with the given dimensions.
    fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        JpegEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buf
    }

    /// Create a small valid RGBA PNG with the given dimensions.
    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_with_encoder(PngEncoder::new(&mut buf))
            .unwrap();
        buf
    }

    fn params(width: u32, height: u32, format: OutputFormat) -> ResizeParams {
        ResizeParams {
            width,
            height,
            format,
            quality: Quality::new(85),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let backend = RustBackend::new();
        let dims = backend.identify(&create_test_jpeg(200, 150)).unwrap();
        assert_eq!(dims, ImageMetadata { width: 200, height: 150 });
    }

    #[test]
    fn identify_garbage_errors() {
        let backend = RustBackend::new();
        assert!(backend.identify(b"definitely not an image").is_err());
    }

    #[test]
    fn crop_returns_png_of_region_size() {
        let backend = RustBackend::new();
        let region = AbsoluteRegion {
            top: 10,
            left: 20,
            width: 50,
            height: 40,
        };
        let out = backend.crop(&create_test_jpeg(200, 150), &region).unwrap();

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 40));
        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Png
        );
    }

    #[test]
    fn crop_outside_image_errors() {
        let backend = RustBackend::new();
        let region = AbsoluteRegion {
            top: 0,
            left: 180,
            width: 50,
            height: 10,
        };
        assert!(backend.crop(&create_test_jpeg(200, 150), &region).is_err());
    }

    #[test]
    fn resize_fills_exact_dimensions_as_jpeg() {
        let backend = RustBackend::new();
        let out = backend
            .resize_and_encode(&create_test_jpeg(400, 300), &params(120, 160, OutputFormat::Jpg))
            .unwrap();

        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 160));
    }

    #[test]
    fn resize_rgba_png_to_jpeg_drops_alpha() {
        let backend = RustBackend::new();
        let out = backend
            .resize_and_encode(&create_test_png(64, 64), &params(32, 32, OutputFormat::Jpg))
            .unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn resize_to_png_keeps_format() {
        let backend = RustBackend::new();
        let out = backend
            .resize_and_encode(&create_test_jpeg(100, 100), &params(600, 600, OutputFormat::Png))
            .unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Png);
        assert_eq!(backend.identify(&out).unwrap().width, 600);
    }

    #[test]
    fn resize_garbage_errors() {
        let backend = RustBackend::new();
        let result = backend.resize_and_encode(b"nope", &params(10, 10, OutputFormat::Png));
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }
}
