//! Object store addressing.
//!
//! Every source and destination in a resize request is an object store URL.
//! Two address forms are accepted:
//!
//! - **Short form**: `s3://container/key/with/slashes.jpg`, the container is
//!   the URL host and the key is the path without its leading slash.
//! - **Host-path form**: `https://s3.eu-west-1.amazonaws.com/container/key.jpg`,
//!   the host is the store endpoint, the first path segment is the container
//!   and the remaining segments (rejoined with `/`) are the key.
//!
//! Anything else is rejected with [`AddressError::UnsupportedFormat`].
//!
//! ## Default destinations
//!
//! When a request carries no destination, one is derived from the source
//! with [`default_destination`]: the naming prefix goes in front of the key
//! and the naming suffix goes between the file stem and its extension. The
//! extension itself is kept as-is.
//!
//! ```text
//! s3://bucket/photo.jpg          → s3://bucket/thumbnail/photo.jpg
//! s3://bucket/profile/me.png     → s3://bucket/thumbnail/profile/me.png
//! (suffix "-thumbnail")          → s3://bucket/profile/me-thumbnail.png
//! ```

use crate::config::NamingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Scheme of the short address form.
pub const SHORT_SCHEME: &str = "s3";

/// Scheme of the host-path address form.
pub const LONG_SCHEME: &str = "https";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Unsupported address format: {0}")]
    UnsupportedFormat(String),
}

/// A `(container, key)` pair inside an object store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAddress {
    pub container: String,
    pub key: String,
}

impl ObjectAddress {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Extension of the key's file name, without the dot.
    pub fn extension(&self) -> Option<&str> {
        file_extension(&self.key)
    }
}

/// Renders the short form, which [`parse_address`] accepts back.
impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", SHORT_SCHEME, self.container, self.key)
    }
}

/// Parse an object store URL into its container and key.
pub fn parse_address(raw: &str) -> Result<ObjectAddress, AddressError> {
    let unsupported = || AddressError::UnsupportedFormat(raw.to_string());
    let url = Url::parse(raw).map_err(|_| unsupported())?;

    let (container, key) = match url.scheme() {
        SHORT_SCHEME => {
            let container = url.host_str().ok_or_else(unsupported)?.to_string();
            let path = url.path();
            let key = path.strip_prefix('/').unwrap_or(path).to_string();
            (container, key)
        }
        LONG_SCHEME => {
            let mut segments = url.path_segments().ok_or_else(unsupported)?;
            let container = segments.next().ok_or_else(unsupported)?.to_string();
            let key = segments.collect::<Vec<_>>().join("/");
            (container, key)
        }
        _ => return Err(unsupported()),
    };

    if container.is_empty() || key.is_empty() {
        return Err(unsupported());
    }
    Ok(ObjectAddress { container, key })
}

/// Extension of the last path component, without the dot.
///
/// Dotfiles (`.hidden`) and names without a dot have no extension.
pub fn file_extension(key: &str) -> Option<&str> {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}

/// Derive the destination used when a request names none.
///
/// Pure and deterministic: the same source always yields the same address,
/// in the same container.
pub fn default_destination(source: &ObjectAddress, naming: &NamingConfig) -> ObjectAddress {
    let (dir, name) = match source.key.rfind('/') {
        Some(pos) => (&source.key[..=pos], &source.key[pos + 1..]),
        None => ("", source.key.as_str()),
    };
    let renamed = match file_extension(name) {
        Some(ext) => {
            let stem = &name[..name.len() - ext.len() - 1];
            format!("{}{}.{}", stem, naming.suffix, ext)
        }
        None => format!("{}{}", name, naming.suffix),
    };
    ObjectAddress {
        container: source.container.clone(),
        key: format!("{}{}{}", naming.prefix, dir, renamed),
    }
}
