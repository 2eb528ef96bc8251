//! Deployer configuration.

use std::path::Path;
use std::time::Duration;

use knfn_reconcile::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WAIT_TIMEOUT};

/// Namespace to deploy into.
pub const NAMESPACE_ENV: &str = "KNFN_NAMESPACE";

/// Enables progress logging while waiting (`1`, `true` or `yes`).
pub const VERBOSE_ENV: &str = "KNFN_VERBOSE";

/// Readiness timeout in seconds.
pub const WAIT_TIMEOUT_ENV: &str = "KNFN_WAIT_TIMEOUT_SECS";

/// Number of update submissions before giving up on conflicts.
pub const UPDATE_ATTEMPTS_ENV: &str = "KNFN_UPDATE_ATTEMPTS";

/// Namespace file mounted into pods by the platform.
pub const SERVICE_ACCOUNT_NAMESPACE_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

const DEFAULT_NAMESPACE: &str = "default";

/// Deployer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployerConfig {
    /// Namespace services are deployed into.
    pub namespace: String,

    /// Log every in-progress readiness observation.
    pub verbose: bool,

    /// How long a new service may take to become ready.
    pub wait_timeout: Duration,

    /// Update submissions per deploy.
    pub update_attempts: u32,
}

impl DeployerConfig {
    /// Configuration with default settings for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            verbose: false,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            update_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A non-empty `namespace` wins over `KNFN_NAMESPACE`, which wins over the
    /// in-cluster service-account namespace. Falls back to `default`.
    pub fn from_env(namespace: Option<&str>) -> Self {
        Self::from_vars(
            namespace,
            |key| std::env::var(key).ok(),
            Path::new(SERVICE_ACCOUNT_NAMESPACE_PATH),
        )
    }

    fn from_vars(
        namespace: Option<&str>,
        var: impl Fn(&str) -> Option<String>,
        service_account_namespace: &Path,
    ) -> Self {
        let namespace = namespace
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
            .or_else(|| non_empty(var(NAMESPACE_ENV)))
            .or_else(|| non_empty(std::fs::read_to_string(service_account_namespace).ok()))
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let verbose = var(VERBOSE_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let wait_timeout = var(WAIT_TIMEOUT_ENV)
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WAIT_TIMEOUT);

        let update_attempts = var(UPDATE_ATTEMPTS_ENV)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        Self {
            namespace,
            verbose,
            wait_timeout,
            update_attempts,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_update_attempts(mut self, attempts: u32) -> Self {
        self.update_attempts = attempts;
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
