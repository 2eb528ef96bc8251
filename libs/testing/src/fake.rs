//! In-memory serving platform.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use knfn_serving::{
    Condition, ConditionStatus, Route, Service, ServiceStatus, ServingClient, ServingError,
    READY_CONDITION,
};

/// A call made against the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetService(String),
    CreateService(String),
    UpdateService(String),
    GetRoute(String),
}

/// How services report readiness when read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessScript {
    /// Ready on every read.
    Ready,

    /// Not ready for the first `n` reads of a service, ready afterwards.
    ReadyAfter(u32),

    /// Ready condition is `False` with the given reason and message.
    Failed { reason: String, message: String },

    /// Never leaves the in-progress state.
    Never,
}

#[derive(Debug)]
struct StoredService {
    service: Service,
    reads: u32,
}

#[derive(Debug)]
struct State {
    services: BTreeMap<String, StoredService>,
    next_version: u64,
    journal: Vec<Call>,
    conflicts_remaining: u32,
    readiness: ReadinessScript,
    lookup_error: Option<ServingError>,
    create_error: Option<ServingError>,
    update_error: Option<ServingError>,
    route_error: Option<ServingError>,
    route_without_url: bool,
}

impl State {
    fn next_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

/// In-memory [`ServingClient`].
///
/// Services keep a `resourceVersion` that changes on every write, and
/// updates carrying a stale version are rejected with a conflict, as the
/// real platform does. Injected failures are sticky: they apply to every
/// matching call.
#[derive(Debug)]
pub struct FakeServingClient {
    namespace: String,
    poll_interval: Duration,
    state: Mutex<State>,
}

impl FakeServingClient {
    /// Empty platform in the given namespace, with a 1 ms poll interval.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            poll_interval: Duration::from_millis(1),
            state: Mutex::new(State {
                services: BTreeMap::new(),
                next_version: 0,
                journal: Vec::new(),
                conflicts_remaining: 0,
                readiness: ReadinessScript::Ready,
                lookup_error: None,
                create_error: None,
                update_error: None,
                route_error: None,
                route_without_url: false,
            }),
        }
    }

    /// Seed an existing service.
    pub fn with_service(self, mut service: Service) -> Self {
        {
            let mut state = self.state();
            service.metadata.namespace = Some(self.namespace.clone());
            service.metadata.resource_version = Some(state.next_version());
            service.metadata.generation = service.metadata.generation.max(1);
            service.status = None;
            state.services.insert(
                service.metadata.name.clone(),
                StoredService { service, reads: 0 },
            );
        }
        self
    }

    /// Reject the next `n` updates as if another writer got there first.
    pub fn with_conflicts(self, n: u32) -> Self {
        self.state().conflicts_remaining = n;
        self
    }

    pub fn with_readiness(self, script: ReadinessScript) -> Self {
        self.state().readiness = script;
        self
    }

    pub fn with_lookup_error(self, err: ServingError) -> Self {
        self.state().lookup_error = Some(err);
        self
    }

    pub fn with_create_error(self, err: ServingError) -> Self {
        self.state().create_error = Some(err);
        self
    }

    pub fn with_update_error(self, err: ServingError) -> Self {
        self.state().update_error = Some(err);
        self
    }

    pub fn with_route_error(self, err: ServingError) -> Self {
        self.state().route_error = Some(err);
        self
    }

    /// Serve routes whose status has no URL yet.
    pub fn with_route_without_url(self) -> Self {
        self.state().route_without_url = true;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Every call made so far.
    pub fn journal(&self) -> Vec<Call> {
        self.state().journal.clone()
    }

    /// Number of journal entries matching `pred`.
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state().journal.iter().filter(|c| pred(*c)).count()
    }

    /// Stored spec of a service, without status.
    pub fn service(&self, name: &str) -> Option<Service> {
        self.state()
            .services
            .get(name)
            .map(|stored| stored.service.clone())
    }

    /// URL the fake assigns to a service.
    pub fn url_for(&self, name: &str) -> String {
        format!("http://{}.{}.example.com", name, self.namespace)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observed_status(
        &self,
        service: &Service,
        reads: u32,
        script: &ReadinessScript,
    ) -> ServiceStatus {
        let (status, reason, message) = match script {
            ReadinessScript::Ready => (ConditionStatus::True, None, None),
            ReadinessScript::ReadyAfter(n) if reads > *n => (ConditionStatus::True, None, None),
            ReadinessScript::ReadyAfter(_) | ReadinessScript::Never => (
                ConditionStatus::Unknown,
                Some("Deploying".to_string()),
                None,
            ),
            ReadinessScript::Failed { reason, message } => (
                ConditionStatus::False,
                Some(reason.clone()),
                Some(message.clone()),
            ),
        };

        ServiceStatus {
            observed_generation: service.metadata.generation,
            conditions: vec![Condition {
                condition_type: READY_CONDITION.to_string(),
                status,
                reason,
                message,
            }],
            url: Some(self.url_for(service.name())),
            ..ServiceStatus::default()
        }
    }
}

#[async_trait]
impl ServingClient for FakeServingClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn get_service(&self, name: &str) -> Result<Service, ServingError> {
        let mut state = self.state();
        state.journal.push(Call::GetService(name.to_string()));

        if let Some(err) = &state.lookup_error {
            return Err(err.clone());
        }

        let script = state.readiness.clone();
        let stored = state
            .services
            .get_mut(name)
            .ok_or_else(|| ServingError::service_not_found(name))?;
        stored.reads += 1;

        let mut service = stored.service.clone();
        service.status = Some(self.observed_status(&service, stored.reads, &script));
        Ok(service)
    }

    async fn create_service(&self, service: &Service) -> Result<(), ServingError> {
        let mut state = self.state();
        state
            .journal
            .push(Call::CreateService(service.name().to_string()));

        if let Some(err) = &state.create_error {
            return Err(err.clone());
        }

        if state.services.contains_key(service.name()) {
            return Err(ServingError::AlreadyExists {
                kind: "service",
                name: service.name().to_string(),
            });
        }

        let mut stored = service.clone();
        stored.metadata.namespace = Some(self.namespace.clone());
        stored.metadata.resource_version = Some(state.next_version());
        stored.metadata.generation = 1;
        stored.status = None;
        state.services.insert(
            stored.metadata.name.clone(),
            StoredService {
                service: stored,
                reads: 0,
            },
        );
        Ok(())
    }

    async fn update_service(&self, service: &Service) -> Result<(), ServingError> {
        let mut state = self.state();
        let name = service.name().to_string();
        state.journal.push(Call::UpdateService(name.clone()));

        if let Some(err) = &state.update_error {
            return Err(err.clone());
        }

        if !state.services.contains_key(&name) {
            return Err(ServingError::service_not_found(name));
        }

        if state.conflicts_remaining > 0 {
            // Another writer wins the race and moves the version on.
            state.conflicts_remaining -= 1;
            let version = state.next_version();
            if let Some(stored) = state.services.get_mut(&name) {
                stored.service.metadata.resource_version = Some(version);
            }
            return Err(ServingError::Conflict {
                kind: "service",
                name,
                message: "the object has been modified".to_string(),
            });
        }

        let version = state.next_version();
        let Some(stored) = state.services.get_mut(&name) else {
            return Err(ServingError::service_not_found(name));
        };

        if stored.service.metadata.resource_version != service.metadata.resource_version {
            return Err(ServingError::Conflict {
                kind: "service",
                name,
                message: "stale resourceVersion".to_string(),
            });
        }

        let generation = stored.service.metadata.generation + 1;
        let mut updated = service.clone();
        updated.metadata.resource_version = Some(version);
        updated.metadata.generation = generation;
        updated.status = None;
        stored.service = updated;
        Ok(())
    }

    async fn get_route(&self, name: &str) -> Result<Route, ServingError> {
        let mut state = self.state();
        state.journal.push(Call::GetRoute(name.to_string()));

        if let Some(err) = &state.route_error {
            return Err(err.clone());
        }

        if !state.services.contains_key(name) {
            return Err(ServingError::route_not_found(name));
        }

        let url = (!state.route_without_url).then(|| self.url_for(name));
        Ok(Route::new(name, url))
    }
}
