//! Image processing — pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop** | `DynamicImage::crop_imm` → lossless PNG |
//! | **Resize → PNG/JPEG** | `resize_to_fill` (Lanczos3) + `image` encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, ImageMetadata};
pub use calculations::{to_absolute, zoom_out};
pub use operations::{Extracted, extract, plan_extract, transform};
pub use params::{AbsoluteRegion, OutputFormat, Quality, RelativeRegion, ResizeParams};
pub use rust_backend::RustBackend;
