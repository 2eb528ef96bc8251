//! Reconciliation primitives for function deploys.
//!
//! This library holds the platform-independent parts of a deploy:
//!
//! - **Env var plans**: turning a flat desired map into set/remove operations.
//! - **Retry on conflict**: re-running a read-modify-write cycle when the
//!   resource changed underneath us.
//! - **Readiness waiting**: polling until a resource reports a terminal
//!   condition, bounded by a deadline.
//!
//! # Invariants
//!
//! - Plans are recomputed on every deploy and never persisted
//! - Every plan carries the `BUILT` marker, so every update is observable
//! - Retry and wait loops are bounded (attempt count, deadline)

use std::time::Duration;

mod env;
mod retry;
mod wait;

pub use env::{EnvVarPlan, BUILT_ENV_VAR, BUILT_FORMAT, REMOVAL_SUFFIX};
pub use retry::{retry_on_conflict, RetryError, RetryPolicy};
pub use wait::{noop_progress, wait_until, ProgressCallback, WaitError};

/// Readiness of a resource as observed by a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Resource reports ready for its latest generation.
    Ready,

    /// Resource is still converging.
    InProgress {
        reason: Option<String>,
        message: Option<String>,
    },

    /// Resource reports a terminal failure.
    Failed {
        reason: Option<String>,
        message: Option<String>,
    },
}

impl Readiness {
    /// In-progress readiness with no further detail.
    pub fn pending() -> Self {
        Self::InProgress {
            reason: None,
            message: None,
        }
    }

    /// Returns true if the resource is ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the resource is still converging.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress { .. })
    }

    /// Returns true if the poll result ends the wait.
    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (label, reason, message) = match self {
            Self::Ready => return write!(f, "ready"),
            Self::InProgress { reason, message } => ("in progress", reason, message),
            Self::Failed { reason, message } => ("failed", reason, message),
        };

        write!(f, "{label}")?;
        if let Some(reason) = reason {
            write!(f, " ({reason})")?;
        }
        if let Some(message) = message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// Default number of update submissions per deploy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default time to wait for a new service to become ready.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
