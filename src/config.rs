//! Resizer configuration module.
//!
//! Handles loading, validating, and merging `thumbnailer.toml`. Stock defaults
//! are overridden by whatever the user file specifies; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! width = 600               # Target width when the request has none
//! height = 600              # Target height when the request has none
//! format = "png"            # Fallback when neither request nor source extension decides
//! zoom_out_factor = 2.0     # Region-of-interest expansion (1.0 = tight crop)
//! check_existing = true     # Reuse a derivative that already exists
//! quality = 90              # JPEG quality (1-100)
//!
//! [naming]
//! prefix = "thumbnail/"     # Put in front of the source key
//! suffix = ""               # Put between file stem and extension
//!
//! [store]
//! backend = "local"         # "local", "memory" or "s3"
//! root = "data"             # Local store root; containers are subdirectories
//! # region = "eu-west-1"    # S3 region (defaults to the AWS environment)
//! # endpoint = "http://localhost:9000"  # S3-compatible endpoint
//!
//! [execution]
//! # stage_timeout_secs = 30 # Bound every store and engine call
//! max_concurrency = 4       # Requests in flight during `batch`
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! [naming]
//! prefix = ""
//! suffix = "-thumbnail"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resizer configuration loaded from `thumbnailer.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// Values used for fields a request leaves out.
    pub defaults: DefaultsConfig,
    /// Rule for deriving a destination from the source address.
    pub naming: NamingConfig,
    /// Which object store backs the addresses.
    pub store: StoreConfig,
    /// Timeouts and batch fan-out.
    pub execution: ExecutionConfig,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.defaults;
        if d.width == 0 || d.height == 0 {
            return Err(ConfigError::Validation(
                "defaults.width and defaults.height must be non-zero".into(),
            ));
        }
        if !d.zoom_out_factor.is_finite() || d.zoom_out_factor < 1.0 {
            return Err(ConfigError::Validation(
                "defaults.zoom_out_factor must be at least 1.0".into(),
            ));
        }
        if d.quality == 0 || d.quality > 100 {
            return Err(ConfigError::Validation(
                "defaults.quality must be 1-100".into(),
            ));
        }
        if self.naming.prefix.is_empty() && self.naming.suffix.is_empty() {
            return Err(ConfigError::Validation(
                "naming.prefix and naming.suffix cannot both be empty: derived destinations would overwrite their sources".into(),
            ));
        }
        if self.execution.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "execution.max_concurrency must be non-zero".into(),
            ));
        }
        if self.execution.stage_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "execution.stage_timeout_secs must be non-zero when set".into(),
            ));
        }
        Ok(())
    }
}

/// Values applied when a request omits a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub width: u32,
    pub height: u32,
    /// Used when neither the request nor the source extension picks a format.
    pub format: OutputFormat,
    pub zoom_out_factor: f64,
    pub check_existing: bool,
    /// JPEG encoding quality (1 = worst, 100 = best). Ignored for PNG.
    pub quality: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            format: OutputFormat::Png,
            zoom_out_factor: 2.0,
            check_existing: true,
            quality: 90,
        }
    }
}

/// Default destination naming: `prefix + dir/ + stem + suffix + .ext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub prefix: String,
    pub suffix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "thumbnail/".to_string(),
            suffix: String::new(),
        }
    }
}

/// Object store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Local,
    Memory,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: StoreKind,
    /// Root directory of the local store.
    pub root: String,
    /// S3 region. When absent the AWS environment decides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::Local,
            root: "data".to_string(),
            region: None,
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Upper bound for each store or engine call. `None` means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,
    /// Maximum requests processed at once by `batch`.
    pub max_concurrency: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: None,
            max_concurrency: 4,
        }
    }
}

impl ExecutionConfig {
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ResizerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Returns stock defaults if `path` does not exist and `required` is false.
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path, required: bool) -> Result<ResizerConfig, ConfigError> {
    if !required && !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Thumbnailer Configuration
# ========================
#
# Every key is optional; delete the ones you don't change.

[defaults]
# Target size used when a request has no width/height.
width = 600
height = 600
# Output format when the request has none and the source key does not end
# in exactly "jpg" or "png". One of "png", "jpg".
format = "png"
# How far to widen a region of interest around its center before cropping.
# 1.0 crops tightly to the region.
zoom_out_factor = 2.0
# Skip all work when the destination already exists.
check_existing = true
# JPEG quality, 1-100. PNG output is lossless and ignores this.
quality = 90

[naming]
# Derived destination = prefix + source directory + stem + suffix + extension.
#   s3://bucket/profile/me.jpg -> s3://bucket/thumbnail/profile/me.jpg
prefix = "thumbnail/"
suffix = ""

[store]
# "local" maps containers to directories under `root`.
# "memory" keeps objects in process (useful for dry runs).
# "s3" talks to Amazon S3 or a compatible service.
backend = "local"
root = "data"
# region = "eu-west-1"
# endpoint = "http://localhost:9000"

[execution]
# Fail a stage when a single store or engine call takes longer than this.
# stage_timeout_secs = 30
# Requests processed concurrently by `thumbnailer batch`.
max_concurrency = 4
"##
}
