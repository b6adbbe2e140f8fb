//! Derivative resolver: effective parameters for one request.
//!
//! Every request field is optional except the source. This module fills the
//! gaps from configuration and from the source address itself:
//!
//! | Field | Explicit | Otherwise |
//! |---|---|---|
//! | format | `format` | source extension if exactly `jpg`/`png`, else `defaults.format` |
//! | width, height | `width`, `height` | `defaults.width`, `defaults.height` |
//! | destination | `destinationAddress` | [`default_destination`] of the source |
//! | check existing | `checkExisting` | `defaults.check_existing` |
//! | zoom-out factor | `zoomOutFactor` | `defaults.zoom_out_factor` |
//!
//! Addresses are parsed before resolving, so resolving itself cannot fail.

use crate::address::{ObjectAddress, default_destination};
use crate::config::{DefaultsConfig, NamingConfig};
use crate::imaging::{OutputFormat, Quality, RelativeRegion, ResizeParams};
use crate::resize::ResizeRequest;

/// Request fields after defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveParams {
    pub source: ObjectAddress,
    pub destination: ObjectAddress,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub region: Option<RelativeRegion>,
    pub check_existing: bool,
    pub zoom_out_factor: f64,
    pub quality: Quality,
}

impl EffectiveParams {
    pub fn resize_params(&self) -> ResizeParams {
        ResizeParams {
            width: self.width,
            height: self.height,
            format: self.format,
            quality: self.quality,
        }
    }
}

/// Output format: explicit, else the source extension, else the default.
pub fn resolve_format(
    explicit: Option<OutputFormat>,
    source: &ObjectAddress,
    default: OutputFormat,
) -> OutputFormat {
    explicit
        .or_else(|| source.extension().and_then(OutputFormat::from_extension))
        .unwrap_or(default)
}

pub fn resolve(
    request: &ResizeRequest,
    source: ObjectAddress,
    destination: Option<ObjectAddress>,
    defaults: &DefaultsConfig,
    naming: &NamingConfig,
) -> EffectiveParams {
    let format = resolve_format(request.format, &source, defaults.format);
    let destination = destination.unwrap_or_else(|| default_destination(&source, naming));
    EffectiveParams {
        format,
        width: request.width.unwrap_or(defaults.width),
        height: request.height.unwrap_or(defaults.height),
        region: request.region,
        check_existing: request.check_existing.unwrap_or(defaults.check_existing),
        zoom_out_factor: request.zoom_out_factor.unwrap_or(defaults.zoom_out_factor),
        quality: Quality::new(defaults.quality),
        source,
        destination,
    }
}
