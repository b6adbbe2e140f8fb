//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take request values, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend, ImageMetadata};
use super::calculations::{to_absolute, zoom_out};
use super::params::{AbsoluteRegion, RelativeRegion, ResizeParams};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Source bytes narrowed to the region of interest.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub data: Vec<u8>,
    pub metadata: ImageMetadata,
    pub region: AbsoluteRegion,
}

/// Plan the crop rectangle without executing it.
///
/// Zoom-out only applies when `zoom_out_factor > 1`; at exactly 1 (or below)
/// the converted region is used as-is.
pub fn plan_extract(
    meta: ImageMetadata,
    region: RelativeRegion,
    zoom_out_factor: f64,
) -> AbsoluteRegion {
    let absolute = to_absolute(meta, region);
    if zoom_out_factor > 1.0 {
        zoom_out(meta, absolute, zoom_out_factor)
    } else {
        absolute
    }
}

/// Identify the source, then crop it to the planned region.
pub fn extract(
    backend: &impl ImageBackend,
    data: &[u8],
    region: RelativeRegion,
    zoom_out_factor: f64,
) -> Result<Extracted> {
    let metadata = backend.identify(data)?;
    let region = plan_extract(metadata, region, zoom_out_factor);
    let data = backend.crop(data, &region)?;
    Ok(Extracted {
        data,
        metadata,
        region,
    })
}

/// Resize the (possibly cropped) image to its target and encode it.
pub fn transform(
    backend: &impl ImageBackend,
    data: &[u8],
    params: &ResizeParams,
) -> Result<Vec<u8>> {
    backend.resize_and_encode(data, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{OutputFormat, Quality};

    fn half_center() -> RelativeRegion {
        RelativeRegion {
            top: 0.25,
            left: 0.25,
            width: 0.5,
            height: 0.5,
        }
    }

    #[test]
    fn plan_without_zoom_is_plain_conversion() {
        let meta = ImageMetadata {
            width: 1000,
            height: 1000,
        };
        let r = plan_extract(meta, half_center(), 1.0);
        assert_eq!(
            r,
            AbsoluteRegion {
                top: 250,
                left: 250,
                width: 500,
                height: 500
            }
        );
    }

    #[test]
    fn plan_below_one_skips_zoom() {
        let meta = ImageMetadata {
            width: 1000,
            height: 1000,
        };
        assert_eq!(
            plan_extract(meta, half_center(), 0.5),
            plan_extract(meta, half_center(), 1.0)
        );
    }

    #[test]
    fn plan_with_zoom_expands_region() {
        let meta = ImageMetadata {
            width: 2000,
            height: 2000,
        };
        // 500..1500 doubled around its center is 0..2000
        let r = plan_extract(meta, half_center(), 2.0);
        assert_eq!(
            r,
            AbsoluteRegion {
                top: 0,
                left: 0,
                width: 2000,
                height: 2000
            }
        );
    }

    #[test]
    fn extract_identifies_then_crops() {
        let backend = MockBackend::with_dimensions(1000, 1000);
        let out = extract(&backend, b"source", half_center(), 1.0).unwrap();

        assert_eq!(out.data, b"cropped");
        assert_eq!(out.metadata.width, 1000);
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], RecordedOp::Identify { len: 6 });
        assert_eq!(
            ops[1],
            RecordedOp::Crop {
                region: out.region
            }
        );
    }

    #[test]
    fn extract_stops_when_identify_fails() {
        let backend = MockBackend::failing("identify");
        assert!(extract(&backend, b"source", half_center(), 2.0).is_err());
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn transform_passes_params_to_backend() {
        let backend = MockBackend::new();
        let params = ResizeParams {
            width: 600,
            height: 600,
            format: OutputFormat::Png,
            quality: Quality::default(),
        };
        let out = transform(&backend, b"cropped", &params).unwrap();
        assert_eq!(out, b"600x600.png");
        assert!(matches!(
            &backend.get_operations()[0],
            RecordedOp::ResizeAndEncode { input, .. } if input == b"cropped"
        ));
    }
}
