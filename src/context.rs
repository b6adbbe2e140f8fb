//! Caller-supplied execution context.
//!
//! The resize pipeline imposes no timeouts of its own. Whoever invokes it
//! hands in a [`RequestContext`], and every external call (store get/list/put,
//! image engine work) is raced against it:
//!
//! - the cancellation token, which fails the call with [`StageCause::Cancelled`];
//! - the overall deadline and the per-call timeout, whichever is nearer, which
//!   fail the call with [`StageCause::TimedOut`].
//!
//! The caller classifies the returned cause into the stage it was running,
//! so a cancellation mid-fetch surfaces as a fetch failure.

use crate::error::StageCause;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    call_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl RequestContext {
    /// An unbounded, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any call still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Bound each individual call to `timeout`.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Context for one request of a larger job: same limits, and cancelled
    /// whenever the parent is.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            call_timeout: self.call_timeout,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time the next call may take: the nearer of the per-call timeout and the
    /// time left until the deadline.
    pub fn budget(&self) -> Option<Duration> {
        let remaining = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()));
        match (remaining, self.call_timeout) {
            (Some(r), Some(c)) => Some(r.min(c)),
            (r, c) => r.or(c),
        }
    }

    /// Run one external call under this context.
    pub async fn run<T, E, F>(&self, fut: F) -> Result<T, StageCause>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<StageCause>,
    {
        if self.cancel.is_cancelled() {
            return Err(StageCause::Cancelled);
        }
        let work = async { fut.await.map_err(Into::into) };
        let budget = self.budget();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StageCause::Cancelled),
            result = bounded(budget, work) => result,
        }
    }

    /// Run CPU-bound work on the blocking pool under this context.
    ///
    /// On cancellation or timeout the caller gets its error right away; the
    /// blocking task itself runs to completion and its output is dropped.
    pub async fn run_blocking<T, E, F>(&self, f: F) -> Result<T, StageCause>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<StageCause> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(StageCause::Cancelled);
        }
        let handle = tokio::task::spawn_blocking(f);
        self.run(async move {
            match handle.await {
                Ok(result) => result.map_err(Into::into),
                Err(e) => Err(StageCause::Aborted(e.to_string())),
            }
        })
        .await
    }
}

async fn bounded<T, F>(budget: Option<Duration>, work: F) -> Result<T, StageCause>
where
    F: Future<Output = Result<T, StageCause>>,
{
    match budget {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => Err(StageCause::TimedOut(limit)),
        },
        None => work.await,
    }
}
