//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the crop rectangle and target size) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing operation logic.
//!
//! ## Types
//!
//! - [`RelativeRegion`] — Region of interest as fractions of the image extent.
//! - [`AbsoluteRegion`] — The same region in whole pixels, clamped to the image.
//! - [`OutputFormat`] — Encoded output format (`png` or `jpg`).
//! - [`Quality`] — Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeParams`] — Target dimensions, format and quality for a resize.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Region of interest expressed as fractions of image height/width.
///
/// Each field is conceptually in `[0, 1]`: `left`/`width` are fractions of the
/// image width, `top`/`height` fractions of the image height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeRegion {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteRegion {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl OutputFormat {
    /// Match a file extension exactly (`"jpg"` or `"png"`, case-sensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    /// MIME type written alongside the stored object.
    ///
    /// `jpg` is the one name that differs from its MIME subtype.
    pub fn content_type(self) -> String {
        match self {
            Self::Jpg => "image/jpeg".to_string(),
            other => format!("image/{}", other.as_str()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for the final resize + encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn jpg_maps_to_jpeg_mime() {
        assert_eq!(OutputFormat::Jpg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
    }

    #[test]
    fn extension_match_is_exact() {
        assert_eq!(OutputFormat::from_extension("jpg"), Some(OutputFormat::Jpg));
        assert_eq!(OutputFormat::from_extension("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("jpeg"), None);
        assert_eq!(OutputFormat::from_extension("JPG"), None);
        assert_eq!(OutputFormat::from_extension("bmp"), None);
    }

    #[test]
    fn format_deserializes_with_jpeg_alias() {
        let f: OutputFormat = serde_json::from_str("\"jpeg\"").unwrap();
        assert_eq!(f, OutputFormat::Jpg);
        let f: OutputFormat = serde_json::from_str("\"png\"").unwrap();
        assert_eq!(f, OutputFormat::Png);
        assert_eq!(serde_json::to_string(&OutputFormat::Jpg).unwrap(), "\"jpg\"");
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(serde_json::from_str::<OutputFormat>("\"gif\"").is_err());
    }
}
