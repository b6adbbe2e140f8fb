//! Bounded concurrent fan-out over many requests.
//!
//! Each request runs independently under a child of the batch context, so
//! cancelling the batch cancels every request still in flight while one
//! request failing leaves the others alone. Requests never share a
//! destination in well-formed input, which is the only coordination the
//! store would otherwise need.

use crate::cache::CacheStats;
use crate::context::RequestContext;
use crate::error::ResizeError;
use crate::imaging::ImageBackend;
use crate::resize::{ResizeRequest, ResizeResult, Resizer};
use crate::store::ObjectStore;
use futures::stream::{self, StreamExt};
use tracing::info;

pub type Outcome = Result<ResizeResult, ResizeError>;

/// Resize every request with at most `max_concurrency` in flight.
///
/// Outcomes come back in input order regardless of completion order.
pub async fn run_batch<S, B>(
    resizer: &Resizer<S, B>,
    requests: &[ResizeRequest],
    ctx: &RequestContext,
    max_concurrency: usize,
) -> Vec<Outcome>
where
    S: ObjectStore,
    B: ImageBackend,
{
    let parallelism = max_concurrency.max(1);
    info!(
        requests = requests.len(),
        max_concurrency = parallelism,
        "Starting batch"
    );

    let mut indexed: Vec<(usize, Outcome)> = stream::iter(requests.iter().enumerate())
        .map(|(index, request)| {
            let child = ctx.child();
            async move { (index, resizer.resize(request, &child).await) }
        })
        .buffer_unordered(parallelism)
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<Outcome> = indexed.into_iter().map(|(_, outcome)| outcome).collect();

    let stats = summarize(&outcomes);
    info!(
        cached = stats.hits,
        resized = stats.misses,
        failed = stats.failures,
        "Batch finished"
    );
    outcomes
}

/// Parse batch input: a JSON array of requests, or one request per line.
///
/// Blank lines are skipped. Errors name the 1-based entry that failed.
pub fn parse_requests(input: &str) -> Result<Vec<ResizeRequest>, ResizeError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(trimmed)
            .map_err(|e| ResizeError::InvalidRequest(e.to_string()))?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, value)| ResizeRequest::from_value(value).map_err(|e| at_entry(i + 1, e)))
            .collect();
    }
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| ResizeRequest::from_json(line).map_err(|e| at_entry(i + 1, e)))
        .collect()
}

fn at_entry(entry: usize, err: ResizeError) -> ResizeError {
    match err {
        ResizeError::InvalidRequest(msg) => {
            ResizeError::InvalidRequest(format!("entry {}: {}", entry, msg))
        }
        other => other,
    }
}

pub fn summarize(outcomes: &[Outcome]) -> CacheStats {
    let mut stats = CacheStats::default();
    for outcome in outcomes {
        match outcome {
            Ok(result) if result.cached => stats.hit(),
            Ok(_) => stats.miss(),
            Err(_) => stats.fail(),
        }
    }
    stats
}
