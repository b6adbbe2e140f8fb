//! Stage-tagged domain errors.
//!
//! Every failure that leaves the resize pipeline is a [`ResizeError`] whose
//! variant names the stage that produced it. Lower-level errors (store, image
//! engine, cancellation) are kept intact as the error `source`, and their text
//! is repeated in the top-level message so a single log line is enough to
//! diagnose a failure.
//!
//! | Variant | Stage | Typical cause |
//! |---|---|---|
//! | `UnsupportedAddressFormat` | address | unknown URL scheme, missing container/key |
//! | `InvalidRequest` | validate | zero width, zoom factor below 1, region out of range |
//! | `ExistenceCheckFailed` | existence-check | store listing failed |
//! | `FetchFailed` | fetch | source missing or unreadable |
//! | `MetadataOrExtractFailed` | extract | undecodable source, bad crop |
//! | `TransformFailed` | transform | resize or encode rejected the input |
//! | `StoreFailed` | store | destination write failed |

use crate::address::{AddressError, ObjectAddress};
use crate::imaging::BackendError;
use crate::store::StoreError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Address,
    Validate,
    ExistenceCheck,
    Fetch,
    Extract,
    Transform,
    Store,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Validate => "validate",
            Self::ExistenceCheck => "existence-check",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The lower-level failure underneath a stage error.
#[derive(Error, Debug)]
pub enum StageCause {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("worker task failed: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("Unsupported address format: {0}")]
    UnsupportedAddressFormat(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Existence check failed for {address}: {source}")]
    ExistenceCheckFailed { address: String, source: StageCause },

    #[error("Fetch failed for {address}: {source}")]
    FetchFailed { address: String, source: StageCause },

    #[error("Metadata or extract failed for {address}: {source}")]
    MetadataOrExtractFailed { address: String, source: StageCause },

    #[error("Transform failed for {address}: {source}")]
    TransformFailed { address: String, source: StageCause },

    #[error("Store failed for {address}: {source}")]
    StoreFailed { address: String, source: StageCause },
}

impl ResizeError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnsupportedAddressFormat(_) => Stage::Address,
            Self::InvalidRequest(_) => Stage::Validate,
            Self::ExistenceCheckFailed { .. } => Stage::ExistenceCheck,
            Self::FetchFailed { .. } => Stage::Fetch,
            Self::MetadataOrExtractFailed { .. } => Stage::Extract,
            Self::TransformFailed { .. } => Stage::Transform,
            Self::StoreFailed { .. } => Stage::Store,
        }
    }

    /// The wrapped lower-level failure, for stage errors.
    pub fn cause(&self) -> Option<&StageCause> {
        match self {
            Self::UnsupportedAddressFormat(_) | Self::InvalidRequest(_) => None,
            Self::ExistenceCheckFailed { source, .. }
            | Self::FetchFailed { source, .. }
            | Self::MetadataOrExtractFailed { source, .. }
            | Self::TransformFailed { source, .. }
            | Self::StoreFailed { source, .. } => Some(source),
        }
    }
}

impl From<AddressError> for ResizeError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::UnsupportedFormat(raw) => Self::UnsupportedAddressFormat(raw),
        }
    }
}

/// Wrap a lower-level failure in the error for `stage`.
///
/// `address` is the object the stage was working on: the source for
/// fetch/extract/transform, the destination for existence-check/store.
pub fn classify(stage: Stage, address: &ObjectAddress, cause: impl Into<StageCause>) -> ResizeError {
    let address = address.to_string();
    let source = cause.into();
    match stage {
        Stage::Address => ResizeError::UnsupportedAddressFormat(format!("{}: {}", address, source)),
        Stage::Validate => ResizeError::InvalidRequest(format!("{}: {}", address, source)),
        Stage::ExistenceCheck => ResizeError::ExistenceCheckFailed { address, source },
        Stage::Fetch => ResizeError::FetchFailed { address, source },
        Stage::Extract => ResizeError::MetadataOrExtractFailed { address, source },
        Stage::Transform => ResizeError::TransformFailed { address, source },
        Stage::Store => ResizeError::StoreFailed { address, source },
    }
}
