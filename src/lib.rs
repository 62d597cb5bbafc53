//! keyscope - hierarchical, focus-aware keyboard scopes for terminal apps.
//!
//! The routing model lives in [`keyscope_core`], the crossterm matcher in
//! [`keyscope_term`]. This crate adds key map configuration files and the
//! interactive demo binary.

pub mod config;
pub mod error;

pub use keyscope_core;
pub use keyscope_term;
