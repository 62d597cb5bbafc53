//! Error types for the keyscope demo application

use keyscope_core::{BindingError, ScopeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyscopeError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Binding(#[from] BindingError),
}

pub type Result<T> = std::result::Result<T, KeyscopeError>;
