//! Deadline-bounded readiness polling.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::Readiness;

/// Observer for intermediate readiness states.
pub type ProgressCallback<'a> = &'a (dyn Fn(&Readiness) + Send + Sync);

/// Progress callback that ignores every observation.
pub fn noop_progress(_: &Readiness) {}

/// Readiness wait errors.
#[derive(Debug, Error)]
pub enum WaitError<E> {
    /// The deadline passed before the resource reached a terminal state.
    #[error("timeout after {elapsed:?} waiting for {resource} to become ready")]
    TimedOut { resource: String, elapsed: Duration },

    /// The resource reported a terminal failure.
    #[error("{resource} failed to become ready: {message} ({reason})")]
    Failed {
        resource: String,
        reason: String,
        message: String,
    },

    /// Polling the resource failed.
    #[error("failed to poll {resource}: {source}")]
    Poll {
        resource: String,
        #[source]
        source: E,
    },
}

impl<E> WaitError<E> {
    /// Returns true if the wait ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Poll until the resource is ready, fails, or `timeout` elapses.
///
/// Both the poll itself and the pause between polls are cut short at the
/// deadline. A timeout too large to represent as an instant never expires.
/// `progress` sees every in-progress observation.
pub async fn wait_until<E, F, Fut>(
    resource: &str,
    timeout: Duration,
    interval: Duration,
    mut poll: F,
    progress: ProgressCallback<'_>,
) -> Result<(), WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness, E>>,
{
    let started = Instant::now();
    let deadline = started.checked_add(timeout);
    let time_left = || {
        deadline.map_or(Duration::MAX, |deadline| {
            deadline.saturating_duration_since(Instant::now())
        })
    };
    let timed_out = || WaitError::TimedOut {
        resource: resource.to_string(),
        elapsed: started.elapsed(),
    };

    loop {
        let remaining = time_left();
        if remaining.is_zero() {
            return Err(timed_out());
        }

        let readiness = match tokio::time::timeout(remaining, poll()).await {
            Err(_) => return Err(timed_out()),
            Ok(Err(source)) => {
                return Err(WaitError::Poll {
                    resource: resource.to_string(),
                    source,
                })
            }
            Ok(Ok(readiness)) => readiness,
        };

        match readiness {
            Readiness::Ready => {
                debug!(resource, elapsed = ?started.elapsed(), "Resource is ready");
                return Ok(());
            }
            Readiness::Failed { reason, message } => {
                return Err(WaitError::Failed {
                    resource: resource.to_string(),
                    reason: reason.unwrap_or_else(|| "Unknown".to_string()),
                    message: message.unwrap_or_else(|| "no message".to_string()),
                });
            }
            in_progress => {
                trace!(resource, state = %in_progress, "Resource not ready yet");
                progress(&in_progress);
            }
        }

        tokio::time::sleep(interval.min(time_left())).await;
    }
}
