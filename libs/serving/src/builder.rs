//! Desired state for a function deployed for the first time.

use std::collections::BTreeMap;

use crate::{
    Container, EnvVar, ObjectMeta, RevisionSpec, RevisionTemplateSpec, Service, ServiceSpec,
};

/// Label that marks a service as managed by knfn.
pub const MANAGED_LABEL: &str = "knfnFunction";

/// Value of [`MANAGED_LABEL`] on managed services.
pub const MANAGED_LABEL_VALUE: &str = "true";

/// Build the service submitted on first deploy.
///
/// New services get a single container running `image` with `VERBOSE=true`.
/// The function's own env vars are only applied by later updates.
pub fn build_new_service(name: &str, image: &str) -> Service {
    let labels = BTreeMap::from([(MANAGED_LABEL.to_string(), MANAGED_LABEL_VALUE.to_string())]);

    let containers = vec![Container {
        name: None,
        image: image.to_string(),
        env: vec![EnvVar::new("VERBOSE", "true")],
    }];

    Service::new(
        ObjectMeta {
            name: name.to_string(),
            labels,
            ..ObjectMeta::default()
        },
        ServiceSpec {
            template: RevisionTemplateSpec {
                spec: RevisionSpec { containers },
            },
        },
    )
}
