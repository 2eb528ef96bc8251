//! # knfn-deployer
//!
//! Deploys a [`Function`] onto a serving platform.
//!
//! A deploy either creates the function's service, waits for it to become
//! ready and prints its URL, or updates the env vars of the existing service
//! in place. See [`Deployer::deploy`].

mod config;
mod deployer;
mod error;
mod function;
pub mod logging;

pub use config::{
    DeployerConfig, NAMESPACE_ENV, SERVICE_ACCOUNT_NAMESPACE_PATH, UPDATE_ATTEMPTS_ENV,
    VERBOSE_ENV, WAIT_TIMEOUT_ENV,
};
pub use deployer::Deployer;
pub use error::DeployError;
pub use function::Function;
