//! # Thumbnailer
//!
//! Crop-and-resize derivative images between object store locations. A
//! request names a source image; the derivative (optionally centered on a
//! region of interest) is written next to it, or wherever the request says,
//! and reused on later requests instead of being recomputed.
//!
//! # Architecture: One Linear Pipeline
//!
//! ```text
//! request ─→ validate ─→ resolve ─→ exists? ──yes──→ result (cached)
//!                                      │no
//!                                      ↓
//!                      fetch ─→ [extract] ─→ transform ─→ store ─→ result
//! ```
//!
//! Each stage is a pure function plus at most one external call (store or
//! image engine). The orchestrator in [`resize`] threads a single
//! `Result` through them, and every failure leaves tagged with the stage that
//! produced it ([`error::ResizeError`]).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`address`] | Object store URL parsing (`s3://` and `https://host/` forms) and default destination naming |
//! | [`resolve`] | Fills request gaps: format from the source extension, size, destination, cache and zoom flags |
//! | [`cache`] | Existence check on the destination, the pipeline's only early exit |
//! | [`resize`] | Request/response types and the orchestrator |
//! | [`batch`] | Bounded concurrent fan-out over many requests |
//! | [`context`] | Caller-supplied deadline, per-call timeout and cancellation |
//! | [`error`] | Stage-tagged error taxonomy and the classifier |
//! | [`imaging`] | Region geometry, image engine trait and its `image`-crate implementation |
//! | [`store`] | Object store trait with memory, local-directory and S3 backends |
//! | [`config`] | `thumbnailer.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Store Is the Cache
//!
//! There is no manifest and no local state. A derivative that exists at its
//! destination is a cache hit, checked with a one-result prefix listing. This
//! keeps every request independent: two processes resizing different images
//! need no coordination, and deleting a derivative is all it takes to force
//! a recompute.
//!
//! ## Two Rounding Regimes
//!
//! Converting a relative region to pixels floors offsets and ceils extents
//! so no pixel of the region is lost. Zooming out rounds to nearest. Both are
//! kept exactly as they are: derivatives already in stores were produced this
//! way, and changing either would shift crops by a pixel.
//!
//! ## Injected Collaborators
//!
//! The store ([`store::ObjectStore`]) and the engine
//! ([`imaging::ImageBackend`]) are passed to [`resize::Resizer`] explicitly.
//! Tests swap in [`store::MemoryStore`] and a recording mock backend and
//! assert on exactly which calls a request made.
//!
//! ## Timeouts Belong to the Caller
//!
//! The pipeline never retries and sets no timeouts. The caller's
//! [`context::RequestContext`] bounds every external call; a cancellation or
//! expiry fails the stage that was running.

pub mod address;
pub mod batch;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod imaging;
pub mod output;
pub mod resize;
pub mod resolve;
pub mod store;

pub use context::RequestContext;
pub use error::ResizeError;
pub use resize::{ResizeRequest, ResizeResult, Resizer};
