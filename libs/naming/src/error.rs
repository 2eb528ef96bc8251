//! Error types for name sanitization.

use thiserror::Error;

/// Errors that can occur when sanitizing or parsing a service name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// The name is empty.
    #[error("name cannot be empty")]
    Empty,

    /// The name contains a character that cannot be mapped.
    #[error("invalid character {character:?} at position {position} in '{name}'")]
    InvalidCharacter {
        name: String,
        character: char,
        position: usize,
    },

    /// The name does not start with a lowercase letter.
    #[error("'{name}' must start with a lowercase letter")]
    InvalidStart { name: String },

    /// The name does not end with a lowercase letter or digit.
    #[error("'{name}' must end with a lowercase letter or digit")]
    InvalidEnd { name: String },

    /// The name exceeds the platform length limit.
    #[error("'{name}' is {len} characters long, the limit is {max}")]
    TooLong { name: String, len: usize, max: usize },
}

impl NamingError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, NamingError::Empty)
    }
}
