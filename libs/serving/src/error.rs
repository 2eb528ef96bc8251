//! Error types for platform calls.

use thiserror::Error;

/// Errors returned by a serving platform client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServingError {
    /// The resource does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// The resource already exists.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// The resource changed between read and write.
    #[error("conflict updating {kind} '{name}': {message}")]
    Conflict {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// Every update attempt ended in a conflict.
    #[error("service '{name}' still conflicting after {attempts} attempts")]
    ConflictExhausted { name: String, attempts: u32 },

    /// The resource cannot be used as requested.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// Any other rejection from the platform.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ServingError {
    /// Not-found error for a service.
    pub fn service_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "service",
            name: name.into(),
        }
    }

    /// Not-found error for a route.
    pub fn route_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "route",
            name: name.into(),
        }
    }

    /// Returns true if the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns true if update retries ran out.
    pub fn is_conflict_exhausted(&self) -> bool {
        matches!(self, Self::ConflictExhausted { .. })
    }
}
