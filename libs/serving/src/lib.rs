//! # knfn-serving
//!
//! Resource model and client contract for a Knative-style serving platform.
//!
//! - [`Service`] and [`Route`] mirror the platform's JSON shape
//! - [`build_new_service`] produces the desired state of a brand-new function
//! - [`ServingClient`] is the seam to the platform API; the retrying update and
//!   the readiness wait are provided on top of its four primitive calls

mod builder;
mod client;
mod error;
mod model;

pub use builder::{build_new_service, MANAGED_LABEL, MANAGED_LABEL_VALUE};
pub use client::ServingClient;
pub use error::ServingError;
pub use model::*;
