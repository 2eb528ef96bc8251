//! Serving resources, in the platform's camelCase JSON shape.
//!
//! Only the fields a deploy reads or writes are modelled.

use std::collections::BTreeMap;

use knfn_reconcile::{EnvVarPlan, Readiness};
use serde::{Deserialize, Serialize};

use crate::ServingError;

/// API version of serving resources.
pub const SERVING_API_VERSION: &str = "serving.knative.dev/v1";

/// Condition type that carries overall readiness.
pub const READY_CONDITION: &str = "Ready";

fn default_api_version() -> String {
    SERVING_API_VERSION.to_string()
}

fn default_service_kind() -> String {
    "Service".to_string()
}

fn default_route_kind() -> String {
    "Route".to_string()
}

/// Metadata shared by all resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Opaque version used for optimistic concurrency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    /// Incremented by the platform on every spec change.
    #[serde(default)]
    pub generation: i64,
}

/// A serving service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_service_kind")]
    pub kind: String,

    pub metadata: ObjectMeta,

    pub spec: ServiceSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
}

impl Service {
    /// A service with the given metadata and spec and no status.
    pub fn new(metadata: ObjectMeta, spec: ServiceSpec) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_service_kind(),
            metadata,
            spec,
            status: None,
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Classify the service's readiness for its current generation.
    ///
    /// A status that lags behind the spec generation is still in progress,
    /// whatever its conditions say.
    pub fn readiness(&self) -> Readiness {
        let Some(status) = &self.status else {
            return Readiness::pending();
        };

        if status.observed_generation < self.metadata.generation {
            return Readiness::InProgress {
                reason: Some("OutdatedGeneration".to_string()),
                message: Some(format!(
                    "observed generation {} of {}",
                    status.observed_generation, self.metadata.generation
                )),
            };
        }

        match status.condition(READY_CONDITION) {
            None => Readiness::pending(),
            Some(condition) => condition.readiness(),
        }
    }
}

/// Desired state of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub template: RevisionTemplateSpec,
}

/// Template from which each new revision is stamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionTemplateSpec {
    pub spec: RevisionSpec,
}

impl RevisionTemplateSpec {
    /// Apply an env var plan to the first container.
    ///
    /// Existing variables are overwritten in place, new ones are appended in
    /// name order, then every name in `to_remove` is deleted. Variables the
    /// plan does not mention are left alone.
    pub fn apply_env_plan(&mut self, plan: &EnvVarPlan) -> Result<(), ServingError> {
        let container = self.spec.containers.first_mut().ok_or_else(|| {
            ServingError::InvalidResource("revision template has no containers".to_string())
        })?;

        for (name, value) in &plan.to_set {
            match container.env.iter_mut().find(|var| &var.name == name) {
                Some(existing) => existing.value = value.clone(),
                None => container.env.push(EnvVar::new(name, value)),
            }
        }

        container
            .env
            .retain(|var| !plan.to_remove.contains(&var.name));

        Ok(())
    }
}

/// Pod-level spec of a revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSpec {
    pub containers: Vec<Container>,
}

/// A container in a revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl Container {
    /// Look up an env var value by name.
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }
}

/// A name/value environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Observed state of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    #[serde(default)]
    pub observed_generation: i64,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_created_revision_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_ready_revision_name: Option<String>,
}

impl ServiceStatus {
    /// Find a condition by type.
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// A status condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,

    pub status: ConditionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Condition {
    /// Map the condition onto a readiness observation.
    pub fn readiness(&self) -> Readiness {
        match self.status {
            ConditionStatus::True => Readiness::Ready,
            ConditionStatus::False => Readiness::Failed {
                reason: self.reason.clone(),
                message: self.message.clone(),
            },
            ConditionStatus::Unknown => Readiness::InProgress {
                reason: self.reason.clone(),
                message: self.message.clone(),
            },
        }
    }
}

/// Tri-state condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// The externally reachable address of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_route_kind")]
    pub kind: String,

    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RouteStatus>,
}

impl Route {
    /// A route with the given name and resolved URL.
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_route_kind(),
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            status: Some(RouteStatus {
                url,
                conditions: Vec::new(),
            }),
        }
    }

    /// Resolved public URL, if the platform has assigned one.
    pub fn url(&self) -> Option<&str> {
        self.status.as_ref()?.url.as_deref()
    }
}

/// Observed state of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn service_with_env(env: &[(&str, &str)]) -> Service {
        Service::new(
            ObjectMeta {
                name: "svc".to_string(),
                ..ObjectMeta::default()
            },
            ServiceSpec {
                template: RevisionTemplateSpec {
                    spec: RevisionSpec {
                        containers: vec![Container {
                            name: None,
                            image: "img:v1".to_string(),
                            env: env.iter().map(|(k, v)| EnvVar::new(*k, *v)).collect(),
                        }],
                    },
                },
            },
        )
    }

    fn plan(pairs: &[(&str, &str)]) -> EnvVarPlan {
        let desired = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvVarPlan::from_desired_at(&desired, Utc.timestamp_opt(0, 0).unwrap())
    }

    fn env_names(service: &Service) -> Vec<&str> {
        service.spec.template.spec.containers[0]
            .env
            .iter()
            .map(|var| var.name.as_str())
            .collect()
    }

    #[test]
    fn test_apply_env_plan_merges() {
        let mut service = service_with_env(&[("VERBOSE", "true"), ("A", "1"), ("B", "x")]);
        service
            .spec
            .template
            .apply_env_plan(&plan(&[("A", "2"), ("B-", ""), ("C", "3")]))
            .unwrap();

        let container = &service.spec.template.spec.containers[0];
        assert_eq!(env_names(&service), vec!["VERBOSE", "A", "BUILT", "C"]);
        assert_eq!(container.env_value("A"), Some("2"));
        assert_eq!(container.env_value("VERBOSE"), Some("true"));
        assert_eq!(container.env_value("BUILT"), Some("19700101T000000"));
        assert_eq!(container.env_value("B"), None);
    }

    #[test]
    fn test_apply_env_plan_removal_applied_last() {
        let mut service = service_with_env(&[("A", "1")]);
        service
            .spec
            .template
            .apply_env_plan(&plan(&[("A", "2"), ("A-", "")]))
            .unwrap();

        assert_eq!(env_names(&service), vec!["BUILT"]);
    }

    #[test]
    fn test_apply_env_plan_built_removal_wins() {
        let mut service = service_with_env(&[("A", "1"), ("BUILT", "old")]);
        service
            .spec
            .template
            .apply_env_plan(&plan(&[("BUILT-", "")]))
            .unwrap();

        assert_eq!(env_names(&service), vec!["A"]);
    }

    #[test]
    fn test_apply_env_plan_missing_removal_is_noop() {
        let mut service = service_with_env(&[("A", "1")]);
        service
            .spec
            .template
            .apply_env_plan(&plan(&[("GONE-", "")]))
            .unwrap();

        assert_eq!(env_names(&service), vec!["A", "BUILT"]);
    }

    #[test]
    fn test_apply_env_plan_without_container() {
        let mut template = RevisionTemplateSpec::default();
        let err = template.apply_env_plan(&plan(&[])).unwrap_err();
        assert!(matches!(err, ServingError::InvalidResource(_)));
    }

    fn with_status(generation: i64, observed: i64, ready: Option<ConditionStatus>) -> Service {
        let mut service = service_with_env(&[]);
        service.metadata.generation = generation;
        service.status = Some(ServiceStatus {
            observed_generation: observed,
            conditions: ready
                .map(|status| Condition {
                    condition_type: READY_CONDITION.to_string(),
                    status,
                    reason: Some("Reason".to_string()),
                    message: None,
                })
                .into_iter()
                .collect(),
            ..ServiceStatus::default()
        });
        service
    }

    fn in_progress(reason: &str) -> Readiness {
        Readiness::InProgress {
            reason: Some(reason.to_string()),
            message: None,
        }
    }

    fn failed(reason: &str) -> Readiness {
        Readiness::Failed {
            reason: Some(reason.to_string()),
            message: None,
        }
    }

    #[rstest]
    #[case(1, 1, Some(ConditionStatus::True), Readiness::Ready)]
    #[case(1, 1, None, Readiness::pending())]
    #[case(1, 1, Some(ConditionStatus::Unknown), in_progress("Reason"))]
    #[case(1, 1, Some(ConditionStatus::False), failed("Reason"))]
    fn test_readiness(
        #[case] generation: i64,
        #[case] observed: i64,
        #[case] ready: Option<ConditionStatus>,
        #[case] expected: Readiness,
    ) {
        assert_eq!(with_status(generation, observed, ready).readiness(), expected);
    }

    #[test]
    fn test_readiness_waits_for_generation() {
        let service = with_status(2, 1, Some(ConditionStatus::True));
        assert!(service.readiness().is_in_progress());
    }

    #[test]
    fn test_readiness_without_status() {
        assert!(service_with_env(&[]).readiness().is_in_progress());
    }

    #[test]
    fn test_service_deserialization() {
        let json = r#"{
            "apiVersion": "serving.knative.dev/v1",
            "kind": "Service",
            "metadata": {
                "name": "www-my--domain-com",
                "namespace": "default",
                "labels": {"knfnFunction": "true"},
                "resourceVersion": "1234",
                "generation": 2
            },
            "spec": {
                "template": {
                    "spec": {
                        "containers": [
                            {"image": "img:v1", "env": [{"name": "VERBOSE", "value": "true"}]}
                        ]
                    }
                }
            },
            "status": {
                "observedGeneration": 2,
                "url": "http://www-my--domain-com.default.example.com",
                "conditions": [
                    {"type": "ConfigurationsReady", "status": "True"},
                    {"type": "Ready", "status": "True"}
                ]
            }
        }"#;

        let service: Service = serde_json::from_str(json).unwrap();
        assert_eq!(service.name(), "www-my--domain-com");
        assert_eq!(service.metadata.resource_version.as_deref(), Some("1234"));
        assert_eq!(
            service.spec.template.spec.containers[0].env_value("VERBOSE"),
            Some("true")
        );
        assert!(service.readiness().is_ready());
    }

    #[test]
    fn test_service_serialization_skips_empty() {
        let service = service_with_env(&[]);
        let json = serde_json::to_value(&service).unwrap();

        assert_eq!(json["apiVersion"], SERVING_API_VERSION);
        assert_eq!(json["kind"], "Service");
        assert!(json.get("status").is_none());
        assert!(json["metadata"].get("resourceVersion").is_none());
        assert!(json["spec"]["template"]["spec"]["containers"][0]
            .get("env")
            .is_none());
    }

    #[test]
    fn test_route_url() {
        let route = Route::new("svc", Some("http://svc.example.com".to_string()));
        assert_eq!(route.url(), Some("http://svc.example.com"));

        let pending = Route::new("svc", None);
        assert_eq!(pending.url(), None);

        let json = r#"{"metadata": {"name": "svc"}}"#;
        let bare: Route = serde_json::from_str(json).unwrap();
        assert_eq!(bare.kind, "Route");
        assert_eq!(bare.url(), None);
    }
}
