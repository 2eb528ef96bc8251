//! Deploy errors.

use knfn_naming::NamingError;
use knfn_reconcile::WaitError;
use knfn_serving::ServingError;
use thiserror::Error;

/// Errors returned by [`Deployer::deploy`](crate::Deployer::deploy).
///
/// Each variant names the phase that failed and wraps the cause.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The function name cannot be turned into a service name.
    #[error("invalid function name: {0}")]
    Naming(#[from] NamingError),

    /// Looking up the existing service failed.
    #[error("failed to get the service: {0}")]
    Lookup(#[source] ServingError),

    /// Creating the service failed.
    #[error("failed to deploy the service: {0}")]
    Create(#[source] ServingError),

    /// The new service did not become ready.
    #[error("failed to wait for the service to become ready: {0}")]
    Readiness(#[source] WaitError<ServingError>),

    /// The route of the new service could not be resolved to a URL.
    #[error("failed to get the route: {0}")]
    RouteLookup(#[source] ServingError),

    /// Every update attempt hit a conflict.
    #[error("failed to update the service: {0}")]
    ConflictExhausted(#[source] ServingError),

    /// Updating the service failed.
    #[error("failed to update the service: {0}")]
    Update(#[source] ServingError),
}

impl DeployError {
    /// Returns true if the new service timed out becoming ready.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Readiness(err) if err.is_timeout())
    }

    /// Classify an update failure.
    pub(crate) fn update(err: ServingError) -> Self {
        if err.is_conflict_exhausted() {
            Self::ConflictExhausted(err)
        } else {
            Self::Update(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_update_classification() {
        let exhausted = DeployError::update(ServingError::ConflictExhausted {
            name: "svc".to_string(),
            attempts: 3,
        });
        assert!(matches!(exhausted, DeployError::ConflictExhausted(_)));
        assert_eq!(
            exhausted.to_string(),
            "failed to update the service: service 'svc' still conflicting after 3 attempts"
        );

        let other = DeployError::update(ServingError::service_not_found("svc"));
        assert!(matches!(other, DeployError::Update(_)));
    }

    #[test]
    fn test_is_timeout() {
        let timed_out = DeployError::Readiness(WaitError::TimedOut {
            resource: "svc".to_string(),
            elapsed: Duration::from_secs(60),
        });
        assert!(timed_out.is_timeout());

        let failed = DeployError::Readiness(WaitError::Failed {
            resource: "svc".to_string(),
            reason: "RevisionFailed".to_string(),
            message: "boom".to_string(),
        });
        assert!(!failed.is_timeout());
        assert!(!DeployError::Create(ServingError::service_not_found("svc")).is_timeout());
    }

    #[test]
    fn test_naming_context() {
        let err = DeployError::from(NamingError::Empty);
        assert!(err.to_string().starts_with("invalid function name: "));
    }
}
