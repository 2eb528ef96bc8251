//! Deploy input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A function to deploy.
///
/// Keys of `env_vars` ending in `-` request removal of the variable named by
/// the rest of the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    /// Function name, sanitized into the service name.
    pub name: String,

    /// Container image reference.
    pub image: String,

    /// Desired env vars.
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
}

impl Function {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            env_vars: BTreeMap::new(),
        }
    }

    /// Add a desired env var.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }
}
