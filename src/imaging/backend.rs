//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the resize pipeline
//! needs from a pixel engine: identify, crop, and resize-and-encode. All of
//! them work on encoded bytes so the pipeline never holds a decoded image
//! across an await point.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` below.

use super::params::{AbsoluteRegion, ResizeParams};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Dimensions read from the source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Implementations must be `Send + Sync + 'static`: the orchestrator shares
/// one backend across concurrent requests and runs its calls on blocking
/// worker threads.
pub trait ImageBackend: Send + Sync + 'static {
    /// Read image dimensions from encoded bytes.
    fn identify(&self, data: &[u8]) -> Result<ImageMetadata, BackendError>;

    /// Cut `region` out of the encoded image, returning losslessly encoded bytes.
    fn crop(&self, data: &[u8], region: &AbsoluteRegion) -> Result<Vec<u8>, BackendError>;

    /// Fill-resize to exactly `params.width` x `params.height` and encode.
    fn resize_and_encode(
        &self,
        data: &[u8],
        params: &ResizeParams,
    ) -> Result<Vec<u8>, BackendError>;
}
