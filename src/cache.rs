//! Existence cache check.
//!
//! A derivative that already exists at its destination is treated as a valid
//! cached result: the pipeline short-circuits before fetching the source, so
//! a repeated request never touches the store beyond one listing call.
//!
//! # Design
//!
//! There is no manifest. The store itself is the cache, and the only question
//! asked is "does the destination key exist?". That is answered with a prefix
//! listing bounded to a single result, which every object store supports
//! cheaply and which needs only list permission on the container.
//!
//! Because the listing is by prefix, a sibling key that merely starts with
//! the destination key (`thumb.jpg.bak` for `thumb.jpg`) also counts as a
//! hit. Derived destinations never collide this way in practice.
//!
//! A failed listing is a failed request ([`ResizeError::ExistenceCheckFailed`]).
//! It is never read as "not there", which would silently turn every store
//! outage into a full recompute and overwrite.
//!
//! ## Bypassing the cache
//!
//! Requests with `checkExisting: false` (or `--no-cache` on the CLI) skip the
//! listing entirely and always recompute and overwrite the destination.

use crate::address::ObjectAddress;
use crate::context::RequestContext;
use crate::error::{ResizeError, Stage, classify};
use crate::store::ObjectStore;
use serde::Serialize;
use std::fmt;

/// Outcome of the existence check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Destination exists; no work done.
    Hit,
    /// Destination absent; the derivative is computed and written.
    Miss,
    /// The request disabled the check.
    Skipped,
}

impl CacheStatus {
    pub fn is_hit(self) -> bool {
        self == Self::Hit
    }
}

/// Whether an object exists at `address`.
pub async fn exists<S>(
    store: &S,
    ctx: &RequestContext,
    address: &ObjectAddress,
) -> Result<bool, ResizeError>
where
    S: ObjectStore + ?Sized,
{
    let count = ctx
        .run(store.list(&address.container, &address.key, 1))
        .await
        .map_err(|cause| classify(Stage::ExistenceCheck, address, cause))?;
    Ok(count == 1)
}

/// Run the existence check if `enabled`.
pub async fn check<S>(
    store: &S,
    ctx: &RequestContext,
    destination: &ObjectAddress,
    enabled: bool,
) -> Result<CacheStatus, ResizeError>
where
    S: ObjectStore + ?Sized,
{
    if !enabled {
        return Ok(CacheStatus::Skipped);
    }
    if exists(store, ctx, destination).await? {
        Ok(CacheStatus::Hit)
    } else {
        Ok(CacheStatus::Miss)
    }
}

/// Summary of a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failures: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn fail(&mut self) {
        self.failures += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.failures
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(f, "{} cached, {} resized", self.hits, self.misses)?;
        } else {
            write!(f, "{} resized", self.misses)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        if self.hits > 0 || self.failures > 0 {
            write!(f, " ({} total)", self.total())?;
        }
        Ok(())
    }
}
