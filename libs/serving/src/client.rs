//! Platform client contract.
//!
//! Implementations provide the four primitive calls against one namespace.
//! The retrying update and the readiness wait are built on top of them and
//! rarely need overriding.

use std::time::Duration;

use async_trait::async_trait;
use knfn_reconcile::{
    retry_on_conflict, wait_until, ProgressCallback, Readiness, RetryError, RetryPolicy,
    WaitError, DEFAULT_POLL_INTERVAL,
};
use tracing::debug;

use crate::{Route, Service, ServingError};

/// Client for a serving platform, bound to a single namespace.
#[async_trait]
pub trait ServingClient: Send + Sync {
    /// Namespace every call operates in.
    fn namespace(&self) -> &str;

    /// Pause between readiness polls.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Fetch a service. Fails with [`ServingError::NotFound`] if it does not exist.
    async fn get_service(&self, name: &str) -> Result<Service, ServingError>;

    /// Create a service.
    async fn create_service(&self, service: &Service) -> Result<(), ServingError>;

    /// Replace a service's spec.
    ///
    /// Must fail with [`ServingError::Conflict`] when the submitted
    /// `resourceVersion` is no longer current.
    async fn update_service(&self, service: &Service) -> Result<(), ServingError>;

    /// Fetch the route of a service.
    async fn get_route(&self, name: &str) -> Result<Route, ServingError>;

    /// Fetch, mutate and submit a service, starting over on conflicts.
    ///
    /// At most `max_attempts` submissions are made (at least one). Conflicts
    /// on every attempt yield [`ServingError::ConflictExhausted`]; any other
    /// error is returned as soon as it happens.
    async fn update_service_with_retry<F>(
        &self,
        name: &str,
        mutate: F,
        max_attempts: u32,
    ) -> Result<(), ServingError>
    where
        F: Fn(Service) -> Result<Service, ServingError> + Send + Sync,
    {
        let mutate = &mutate;
        retry_on_conflict(
            RetryPolicy::new(max_attempts),
            ServingError::is_conflict,
            move |attempt| async move {
                let current = self.get_service(name).await?;
                let updated = mutate(current)?;
                debug!(service = name, attempt, "Submitting service update");
                self.update_service(&updated).await
            },
        )
        .await
        .map_err(|err| match err {
            RetryError::Exhausted { attempts, .. } => ServingError::ConflictExhausted {
                name: name.to_string(),
                attempts,
            },
            RetryError::Fatal(err) => err,
        })
    }

    /// Poll a service until it is ready, has failed, or `timeout` elapses.
    ///
    /// A service that is not visible yet counts as in progress.
    async fn wait_for_service(
        &self,
        name: &str,
        timeout: Duration,
        progress: ProgressCallback<'_>,
    ) -> Result<(), WaitError<ServingError>> {
        wait_until(
            name,
            timeout,
            self.poll_interval(),
            move || async move {
                match self.get_service(name).await {
                    Ok(service) => Ok(service.readiness()),
                    Err(err) if err.is_not_found() => Ok(Readiness::pending()),
                    Err(err) => Err(err),
                }
            },
            progress,
        )
        .await
    }
}
