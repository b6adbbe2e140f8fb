//! CLI output formatting.
//!
//! # Display Contract
//!
//! Every request is shown as a header line naming the source and where its
//! derivative lives, followed by indented context lines. Batches prefix each
//! header with its 1-based position in the input so failures can be traced
//! back to the offending line.
//!
//! ```text
//! 001 s3://bucket/photo.jpg → s3://bucket/thumbnail/photo.jpg
//!     600x600 jpg
//!     Region: top 0.25, left 0.25, width 0.5, height 0.5 (zoom 2)
//!     Status: resized
//! 002 s3://bucket/missing.jpg
//!     Failed at fetch: Fetch failed for s3://bucket/missing.jpg: Object not found: ...
//!
//! 1 resized, 1 failed (2 total)
//! ```
//!
//! All `format_*` functions are pure and return lines; the `print_*`
//! wrappers write them to stdout (results) or stderr (errors).

use crate::batch::{Outcome, summarize};
use crate::error::ResizeError;
use crate::resize::{ResizeRequest, ResizeResult};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn with_index(index: Option<usize>, line: String) -> String {
    match index {
        Some(i) => format!("{} {}", format_index(i), line),
        None => line,
    }
}

// ============================================================================
// Single request
// ============================================================================

/// Format a successful resize.
pub fn format_result(index: Option<usize>, result: &ResizeResult) -> Vec<String> {
    let mut lines = vec![with_index(
        index,
        format!(
            "{} → {}",
            result.source_address, result.destination_address
        ),
    )];
    lines.push(format!(
        "{}{}x{} {}",
        indent(1),
        result.width,
        result.height,
        result.format
    ));
    if let Some(region) = &result.region {
        lines.push(format!(
            "{}Region: top {}, left {}, width {}, height {} (zoom {})",
            indent(1),
            region.top,
            region.left,
            region.width,
            region.height,
            result.zoom_out_factor
        ));
    }
    let status = if result.cached { "cached" } else { "resized" };
    lines.push(format!("{}Status: {}", indent(1), status));
    lines
}

/// Format a failed resize. The stage leads so failures group visually.
pub fn format_error(index: Option<usize>, source: &str, error: &ResizeError) -> Vec<String> {
    vec![
        with_index(index, source.to_string()),
        format!("{}Failed at {}: {}", indent(1), error.stage(), error),
    ]
}

pub fn print_result(result: &ResizeResult) {
    for line in format_result(None, result) {
        println!("{}", line);
    }
}

pub fn print_error(source: &str, error: &ResizeError) {
    for line in format_error(None, source, error) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format every outcome of a batch followed by a summary line.
pub fn format_batch(requests: &[ResizeRequest], outcomes: &[Outcome]) -> Vec<String> {
    let mut lines = Vec::new();
    for (pos, (request, outcome)) in requests.iter().zip(outcomes).enumerate() {
        let index = Some(pos + 1);
        match outcome {
            Ok(result) => lines.extend(format_result(index, result)),
            Err(e) => lines.extend(format_error(index, &request.source_address, e)),
        }
    }
    lines.push(String::new());
    lines.push(summarize(outcomes).to_string());
    lines
}

pub fn print_batch(requests: &[ResizeRequest], outcomes: &[Outcome]) {
    for line in format_batch(requests, outcomes) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ObjectAddress;
    use crate::error::{Stage, classify};
    use crate::imaging::{OutputFormat, RelativeRegion};
    use crate::store::StoreError;

    fn result(cached: bool) -> ResizeResult {
        ResizeResult {
            source_address: "s3://bucket/photo.jpg".into(),
            destination_address: "s3://bucket/thumbnail/photo.jpg".into(),
            width: 600,
            height: 600,
            format: OutputFormat::Jpg,
            region: None,
            check_existing: true,
            zoom_out_factor: 2.0,
            cached,
        }
    }

    fn fetch_error() -> ResizeError {
        classify(
            Stage::Fetch,
            &ObjectAddress::new("bucket", "missing.jpg"),
            StoreError::NotFound("s3://bucket/missing.jpg".into()),
        )
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn result_without_region() {
        assert_eq!(
            format_result(None, &result(false)),
            vec![
                "s3://bucket/photo.jpg → s3://bucket/thumbnail/photo.jpg",
                "    600x600 jpg",
                "    Status: resized",
            ]
        );
    }

    #[test]
    fn cached_result_with_region_and_index() {
        let mut r = result(true);
        r.region = Some(RelativeRegion {
            top: 0.25,
            left: 0.25,
            width: 0.5,
            height: 0.5,
        });
        let lines = format_result(Some(3), &r);
        assert_eq!(
            lines[0],
            "003 s3://bucket/photo.jpg → s3://bucket/thumbnail/photo.jpg"
        );
        assert_eq!(
            lines[2],
            "    Region: top 0.25, left 0.25, width 0.5, height 0.5 (zoom 2)"
        );
        assert_eq!(lines[3], "    Status: cached");
    }

    #[test]
    fn error_names_stage_and_cause() {
        let lines = format_error(None, "s3://bucket/missing.jpg", &fetch_error());
        assert_eq!(lines[0], "s3://bucket/missing.jpg");
        assert_eq!(
            lines[1],
            "    Failed at fetch: Fetch failed for s3://bucket/missing.jpg: Object not found: s3://bucket/missing.jpg"
        );
    }

    #[test]
    fn batch_lists_outcomes_then_summary() {
        let requests = vec![
            ResizeRequest::new("s3://bucket/photo.jpg"),
            ResizeRequest::new("s3://bucket/missing.jpg"),
        ];
        let outcomes = vec![Ok(result(false)), Err(fetch_error())];
        let lines = format_batch(&requests, &outcomes);

        assert!(lines[0].starts_with("001 s3://bucket/photo.jpg"));
        assert_eq!(lines[3], "002 s3://bucket/missing.jpg");
        assert!(lines[4].starts_with("    Failed at fetch:"));
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "1 resized, 1 failed (2 total)");
    }
}
