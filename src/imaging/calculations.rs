//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Two rounding regimes live side by side and are both intentional:
//!
//! - [`to_absolute`] floors offsets and ceils extents, so a relative region
//!   never loses a partially covered pixel row or column.
//! - [`zoom_out`] rounds to the nearest integer.
//!
//! Both clamp their result to the image so it can be handed straight to a crop.

use super::backend::ImageMetadata;
use super::params::{AbsoluteRegion, RelativeRegion};

/// Convert a relative region of interest into a pixel rectangle.
///
/// # Arguments
/// * `meta` - Dimensions of the decoded source image
/// * `region` - Region as fractions of the image extent
///
/// # Returns
/// * Pixel rectangle with `left + width <= meta.width` and
///   `top + height <= meta.height`
///
/// # Examples
/// ```
/// # use thumbnailer::imaging::{AbsoluteRegion, ImageMetadata, RelativeRegion, to_absolute};
/// let meta = ImageMetadata { width: 1000, height: 1000 };
/// let region = RelativeRegion { left: 0.25, top: 0.25, width: 0.5, height: 0.5 };
/// assert_eq!(
///     to_absolute(meta, region),
///     AbsoluteRegion { left: 250, top: 250, width: 500, height: 500 }
/// );
/// ```
pub fn to_absolute(meta: ImageMetadata, region: RelativeRegion) -> AbsoluteRegion {
    let img_w = meta.width as f64;
    let img_h = meta.height as f64;

    let left = (img_w * region.left).floor().max(0.0) as u32;
    let top = (img_h * region.top).floor().max(0.0) as u32;
    let width = (img_w * region.width).ceil().min(img_w) as u32;
    let height = (img_h * region.height).ceil().min(img_h) as u32;

    let (left, width) = clamp_span(left, width, meta.width);
    let (top, height) = clamp_span(top, height, meta.height);
    AbsoluteRegion {
        top,
        left,
        width,
        height,
    }
}

/// Grow a pixel rectangle around its center by `factor`.
///
/// `factor = 1.0` returns the region unchanged; `factor = 2.0` doubles both
/// extents and moves the origin back by half the added margin. The result is
/// clamped to the image: the origin never goes negative and the extents
/// never run past the right/bottom edge.
pub fn zoom_out(meta: ImageMetadata, region: AbsoluteRegion, factor: f64) -> AbsoluteRegion {
    let (left, width) = zoom_span(region.left, region.width, factor, meta.width);
    let (top, height) = zoom_span(region.top, region.height, factor, meta.height);
    AbsoluteRegion {
        top,
        left,
        width,
        height,
    }
}

/// Scale one axis of a rectangle and re-center it, rounding to nearest.
fn zoom_span(offset: u32, extent: u32, factor: f64, limit: u32) -> (u32, u32) {
    let scaled = (extent as f64 * factor).round();
    let margin = scaled - extent as f64;
    let offset = (offset as f64 - margin / 2.0).round().max(0.0) as u32;
    let extent = scaled.min(limit as f64) as u32;
    clamp_span(offset, extent, limit)
}

/// Fit `[offset, offset + extent)` inside `[0, limit)`, keeping at least one pixel.
fn clamp_span(offset: u32, extent: u32, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let offset = offset.min(limit - 1);
    let extent = extent.clamp(1, limit - offset);
    (offset, extent)
}
