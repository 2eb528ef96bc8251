//! Bounded retry for optimistic-concurrency conflicts.
//!
//! There is no lock on a platform resource. A read-modify-write cycle that
//! loses a race is rejected with a conflict and has to be re-run from the
//! read, so the whole cycle is the unit of retry.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::DEFAULT_MAX_ATTEMPTS;

/// Retry errors.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt ended in a conflict.
    #[error("still conflicting after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        last: E,
    },

    /// A non-conflict error, returned without retrying.
    #[error(transparent)]
    Fatal(E),
}

impl<E> RetryError<E> {
    /// Returns true if the attempt budget was used up by conflicts.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns the error from the last attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Fatal(err) => err,
        }
    }
}

/// How often, and how patiently, to retry a conflicting operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Pause between a conflict and the next attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt budget and no backoff.
    ///
    /// A budget of zero still makes one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::ZERO,
        }
    }

    /// Set the pause between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Run `op` until it succeeds, fails with a non-conflict error, or the
/// attempt budget is spent.
///
/// `op` receives the 1-based attempt number. `is_conflict` decides which
/// errors are worth another attempt.
pub async fn retry_on_conflict<T, E, P, F, Fut>(
    policy: RetryPolicy,
    is_conflict: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_conflict(&err) {
            return Err(RetryError::Fatal(err));
        }

        if attempt >= max_attempts {
            warn!(attempts = attempt, error = %err, "Conflict retries exhausted");
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }

        debug!(attempt, max_attempts, error = %err, "Conflict detected, retrying");
        if !policy.backoff.is_zero() {
            tokio::time::sleep(policy.backoff).await;
        }
        attempt += 1;
    }
}
