//! Object store abstraction.
//!
//! The resize pipeline treats the store as an opaque key-value blob store
//! addressed by `(container, key)`. It needs exactly three operations:
//!
//! | Operation | Used by |
//! |---|---|
//! | [`ObjectStore::get`] | fetch stage |
//! | [`ObjectStore::put`] | store stage (the only mutating call) |
//! | [`ObjectStore::list`] | existence check (prefix listing, bounded count) |
//!
//! Backends:
//!
//! - [`MemoryStore`] — in-process map with an operation log, used by tests and
//!   dry runs.
//! - [`LocalStore`] — containers are directories under a root.
//! - [`S3Store`] — Amazon S3 or a compatible service (feature `s3`).

use crate::address::ObjectAddress;
use crate::config::{StoreConfig, StoreKind};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

pub mod local;
pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;

pub use local::LocalStore;
pub use memory::{MemoryStore, OpKind, StoreOp};
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Object store abstraction.
///
/// Implementations must be safe to share between concurrently running
/// requests; each request only touches its own source and destination keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object's full contents. Missing objects yield [`StoreError::NotFound`].
    async fn get(&self, address: &ObjectAddress) -> StoreResult<Bytes>;

    /// Write (or overwrite) an object.
    async fn put(
        &self,
        address: &ObjectAddress,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()>;

    /// Count objects in `container` whose key starts with `prefix`, stopping at `max_results`.
    async fn list(&self, container: &str, prefix: &str, max_results: usize) -> StoreResult<usize>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn get(&self, address: &ObjectAddress) -> StoreResult<Bytes> {
        (**self).get(address).await
    }

    async fn put(
        &self,
        address: &ObjectAddress,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()> {
        (**self).put(address, data, content_type).await
    }

    async fn list(&self, container: &str, prefix: &str, max_results: usize) -> StoreResult<usize> {
        (**self).list(container, prefix, max_results).await
    }
}

/// Build the store selected by configuration.
pub async fn create_store(config: &StoreConfig) -> StoreResult<Arc<dyn ObjectStore>> {
    match config.backend {
        StoreKind::Memory => {
            tracing::info!("Using in-memory object store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Local => {
            tracing::info!(root = %config.root, "Using local object store");
            Ok(Arc::new(LocalStore::new(&config.root).await?))
        }
        #[cfg(feature = "s3")]
        StoreKind::S3 => {
            tracing::info!(
                region = ?config.region,
                endpoint = ?config.endpoint,
                "Using S3 object store"
            );
            Ok(Arc::new(
                S3Store::new(config.region.clone(), config.endpoint.clone()).await,
            ))
        }
        #[cfg(not(feature = "s3"))]
        StoreKind::S3 => Err(StoreError::Config(
            "S3 support not compiled in (enable the `s3` feature)".to_string(),
        )),
    }
}
