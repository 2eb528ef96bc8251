//! Create-or-update deploys.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use knfn_naming::ServiceName;
use knfn_reconcile::{noop_progress, EnvVarPlan, ProgressCallback, Readiness};
use knfn_serving::{build_new_service, Service, ServingClient, ServingError};
use tracing::{debug, info, warn};

use crate::{DeployError, DeployerConfig, Function};

/// Deploys functions through a [`ServingClient`].
pub struct Deployer<C> {
    config: DeployerConfig,
    client: C,
    output: Mutex<Box<dyn Write + Send>>,
}

impl<C: ServingClient> Deployer<C> {
    /// Deployer printing to stdout.
    pub fn new(config: DeployerConfig, client: C) -> Self {
        if config.namespace != client.namespace() {
            warn!(
                configured = %config.namespace,
                client = client.namespace(),
                "Client is bound to a different namespace than configured"
            );
        }

        Self {
            config,
            client,
            output: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Send the deployed URL to `output` instead of stdout.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Mutex::new(Box::new(output));
        self
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Deploy a function.
    ///
    /// If no service exists under the sanitized name, one is created with the
    /// function's image, awaited until ready, and its URL printed. Otherwise
    /// the existing service's env vars are reconciled against
    /// `function.env_vars` and the update is retried on conflicts.
    pub async fn deploy(&self, function: &Function) -> Result<(), DeployError> {
        let name = ServiceName::sanitize(&function.name)?;

        debug!(
            service = %name,
            namespace = self.client.namespace(),
            "Looking up service"
        );

        match self.client.get_service(name.as_str()).await {
            Ok(_) => self.update(&name, function).await,
            Err(err) if err.is_not_found() => self.create(&name, function).await,
            Err(err) => Err(DeployError::Lookup(err)),
        }
    }

    async fn create(&self, name: &ServiceName, function: &Function) -> Result<(), DeployError> {
        let service = build_new_service(name.as_str(), &function.image);

        self.client
            .create_service(&service)
            .await
            .map_err(DeployError::Create)?;

        info!(
            service = %name,
            namespace = self.client.namespace(),
            image = %function.image,
            "Service created"
        );

        let log_progress = |readiness: &Readiness| {
            info!(service = %name, %readiness, "Waiting for service to become ready");
        };
        let progress: ProgressCallback<'_> = if self.config.verbose {
            &log_progress
        } else {
            &noop_progress
        };

        self.client
            .wait_for_service(name.as_str(), self.config.wait_timeout, progress)
            .await
            .map_err(DeployError::Readiness)?;

        info!(service = %name, "Service is ready");

        let route = self
            .client
            .get_route(name.as_str())
            .await
            .map_err(DeployError::RouteLookup)?;

        let url = route.url().ok_or_else(|| {
            DeployError::RouteLookup(ServingError::InvalidResource(format!(
                "route '{name}' has no URL"
            )))
        })?;

        self.print_url(url);
        Ok(())
    }

    async fn update(&self, name: &ServiceName, function: &Function) -> Result<(), DeployError> {
        let plan = EnvVarPlan::from_desired(&function.env_vars);

        debug!(
            service = %name,
            to_set = plan.to_set.len(),
            to_remove = plan.to_remove.len(),
            built = plan.built(),
            "Reconciling env vars"
        );

        let apply = |mut service: Service| -> Result<Service, ServingError> {
            service.spec.template.apply_env_plan(&plan)?;
            Ok(service)
        };

        self.client
            .update_service_with_retry(name.as_str(), apply, self.config.update_attempts)
            .await
            .map_err(DeployError::update)?;

        info!(
            service = %name,
            namespace = self.client.namespace(),
            "Service updated"
        );
        Ok(())
    }

    fn print_url(&self, url: &str) {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(output, "Function deployed on: {url}") {
            warn!(error = %err, url, "Failed to write deployed URL");
        }
    }
}
