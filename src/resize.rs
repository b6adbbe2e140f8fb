//! Resize orchestrator.
//!
//! Turns one [`ResizeRequest`] into a stored derivative. The pipeline is a
//! straight line with a single early exit:
//!
//! ```text
//! validate → parse addresses → resolve ─┬─ destination exists ──────────────→ done (cached)
//!                                       └─ fetch → [extract] → transform → store → done
//! ```
//!
//! - **Validate**: reject impossible sizes, zoom factors and regions before
//!   any store call.
//! - **Existence check**: skipped when `checkExisting` is false (see [`crate::cache`]).
//! - **Fetch**: read the source bytes.
//! - **Extract**: only when a region is given. Identify the source, convert the
//!   region to pixels, widen it by the zoom-out factor and crop.
//! - **Transform**: fill-resize to the target size and encode.
//! - **Store**: the only mutating step, reached only after transform succeeds,
//!   so a failed request never leaves partial output at the destination.
//!
//! Every external call runs under the caller's [`RequestContext`]. Nothing is
//! retried here; a failure ends the request with a stage-tagged
//! [`ResizeError`].

use crate::address::parse_address;
use crate::cache::{self, CacheStatus};
use crate::config::ResizerConfig;
use crate::context::RequestContext;
use crate::error::{ResizeError, Stage, classify};
use crate::imaging::{ImageBackend, OutputFormat, RelativeRegion, extract, transform};
use crate::resolve::{EffectiveParams, resolve};
use crate::store::ObjectStore;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, field, info, info_span, warn};

/// A resize request as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    pub source_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RelativeRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_existing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_out_factor: Option<f64>,
}

impl ResizeRequest {
    /// A request for `source` with every other field defaulted.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source_address: source.into(),
            destination_address: None,
            width: None,
            height: None,
            format: None,
            region: None,
            check_existing: None,
            zoom_out_factor: None,
        }
    }

    /// Parse a request from JSON.
    ///
    /// Accepts the request object itself or a JSON string holding it, which
    /// is how some event sources deliver their payload.
    pub fn from_json(raw: &str) -> Result<Self, ResizeError> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(invalid)?;
        let value = match value {
            serde_json::Value::String(inner) => serde_json::from_str(&inner).map_err(invalid)?,
            other => other,
        };
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ResizeError> {
        serde_json::from_value(value).map_err(invalid)
    }

    /// Reject field values no defaulting can fix.
    pub fn validate(&self) -> Result<(), ResizeError> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ResizeError::InvalidRequest(
                "width and height must be positive".into(),
            ));
        }
        if let Some(zoom) = self.zoom_out_factor {
            if !zoom.is_finite() || zoom < 1.0 {
                return Err(ResizeError::InvalidRequest(format!(
                    "zoomOutFactor must be at least 1, got {}",
                    zoom
                )));
            }
        }
        if let Some(region) = &self.region {
            validate_region(region)?;
        }
        Ok(())
    }
}

fn validate_region(region: &RelativeRegion) -> Result<(), ResizeError> {
    let fields = [
        ("top", region.top),
        ("left", region.left),
        ("width", region.width),
        ("height", region.height),
    ];
    for (name, value) in fields {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ResizeError::InvalidRequest(format!(
                "region.{} must be within [0, 1], got {}",
                name, value
            )));
        }
    }
    if region.width == 0.0 || region.height == 0.0 {
        return Err(ResizeError::InvalidRequest(
            "region width and height must be non-zero".into(),
        ));
    }
    Ok(())
}

fn invalid(err: serde_json::Error) -> ResizeError {
    ResizeError::InvalidRequest(err.to_string())
}

/// The request with every field resolved, plus what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeResult {
    pub source_address: String,
    /// The destination written, or found already present.
    pub destination_address: String,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<RelativeRegion>,
    pub check_existing: bool,
    pub zoom_out_factor: f64,
    /// True when an existing derivative was reused and nothing was written.
    pub cached: bool,
}

impl ResizeResult {
    fn new(request: &ResizeRequest, params: &EffectiveParams, cached: bool) -> Self {
        Self {
            source_address: request.source_address.clone(),
            destination_address: request
                .destination_address
                .clone()
                .unwrap_or_else(|| params.destination.to_string()),
            width: params.width,
            height: params.height,
            format: params.format,
            region: params.region,
            check_existing: params.check_existing,
            zoom_out_factor: params.zoom_out_factor,
            cached,
        }
    }
}

/// Drives requests through the pipeline against one store and one engine.
///
/// Holds no per-request state; share one instance across concurrent requests.
pub struct Resizer<S, B> {
    store: S,
    backend: Arc<B>,
    config: ResizerConfig,
}

impl<S: ObjectStore, B: ImageBackend> Resizer<S, B> {
    pub fn new(store: S, backend: B, config: ResizerConfig) -> Self {
        Self {
            store,
            backend: Arc::new(backend),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ResizerConfig {
        &self.config
    }

    /// Produce (or reuse) the derivative described by `request`.
    pub async fn resize(
        &self,
        request: &ResizeRequest,
        ctx: &RequestContext,
    ) -> Result<ResizeResult, ResizeError> {
        let span = info_span!(
            "resize",
            source = %request.source_address,
            destination = field::Empty,
        );
        let result = self.run(request, ctx).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| warn!(stage = %e.stage(), error = %e, "Resize failed"));
        }
        result
    }

    async fn run(
        &self,
        request: &ResizeRequest,
        ctx: &RequestContext,
    ) -> Result<ResizeResult, ResizeError> {
        request.validate()?;
        let source = parse_address(&request.source_address)?;
        let destination = request
            .destination_address
            .as_deref()
            .map(parse_address)
            .transpose()?;

        let params = resolve(
            request,
            source,
            destination,
            &self.config.defaults,
            &self.config.naming,
        );
        tracing::Span::current().record("destination", field::display(&params.destination));
        debug!(
            format = %params.format,
            width = params.width,
            height = params.height,
            check_existing = params.check_existing,
            zoom_out_factor = params.zoom_out_factor,
            region = ?params.region,
            "Resolved parameters"
        );

        let status =
            cache::check(&self.store, ctx, &params.destination, params.check_existing).await?;
        if status == CacheStatus::Hit {
            info!("Destination exists, reusing it");
            return Ok(ResizeResult::new(request, &params, true));
        }

        let data = ctx
            .run(self.store.get(&params.source))
            .await
            .map_err(|cause| classify(Stage::Fetch, &params.source, cause))?;
        info!(size_bytes = data.len(), "Fetched source");

        let image = match params.region {
            Some(region) => self.extract_region(ctx, &params, data, region).await?,
            None => data,
        };

        let resize_params = params.resize_params();
        let backend = Arc::clone(&self.backend);
        let encoded = ctx
            .run_blocking(move || transform(&*backend, &image, &resize_params))
            .await
            .map_err(|cause| classify(Stage::Transform, &params.source, cause))?;
        debug!(size_bytes = encoded.len(), "Encoded derivative");

        let content_type = params.format.content_type();
        let size = encoded.len();
        ctx.run(
            self.store
                .put(&params.destination, Bytes::from(encoded), &content_type),
        )
        .await
        .map_err(|cause| classify(Stage::Store, &params.destination, cause))?;
        info!(size_bytes = size, content_type = %content_type, "Stored derivative");

        Ok(ResizeResult::new(request, &params, false))
    }

    async fn extract_region(
        &self,
        ctx: &RequestContext,
        params: &EffectiveParams,
        data: Bytes,
        region: RelativeRegion,
    ) -> Result<Bytes, ResizeError> {
        let backend = Arc::clone(&self.backend);
        let zoom = params.zoom_out_factor;
        let extracted = ctx
            .run_blocking(move || extract(&*backend, &data, region, zoom))
            .await
            .map_err(|cause| classify(Stage::Extract, &params.source, cause))?;
        debug!(
            image_width = extracted.metadata.width,
            image_height = extracted.metadata.height,
            left = extracted.region.left,
            top = extracted.region.top,
            width = extracted.region.width,
            height = extracted.region.height,
            "Extracted region"
        );
        Ok(Bytes::from(extracted.data))
    }
}
