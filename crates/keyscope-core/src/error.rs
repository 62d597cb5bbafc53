//! Error types for keyscope core.

use thiserror::Error;

/// Errors reported by a matcher while attaching or binding.
///
/// Matcher implementations construct these; the scope tree passes them
/// through to the caller untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("invalid key sequence '{sequence}': {reason}")]
    InvalidSequence { sequence: String, reason: String },

    #[error("invalid trigger '{action}' for sequence '{sequence}'")]
    InvalidAction { sequence: String, action: String },

    #[error("cannot attach to {target}: {reason}")]
    Target { target: String, reason: String },
}

/// Errors that can occur while mounting or updating a scope
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Binding(#[from] BindingError),
}

pub type Result<T> = std::result::Result<T, ScopeError>;
