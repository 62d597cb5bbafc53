//! keyscope-core - hierarchical, focus-aware key routing.
//!
//! Nested [`Scope`]s each own a key map and a set of handlers. The scope
//! nearest the focused region handles a fired sequence; ancestors with an
//! overlapping binding stay silent for that sequence value until a blur or
//! unmount clears it. Raw key events and sequence syntax belong to a
//! [`Matcher`] implementation.

pub mod binding;
pub mod boundary;
pub mod error;
pub mod hotkey;
pub mod matcher;
pub mod merge;
pub mod resolve;
pub mod scope;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use binding::BindingSynchronizer;
pub use boundary::{BOUNDARY_TAB_INDEX, BoundaryId, FocusBoundary, FocusCallback, HostElement};
pub use error::{BindingError, Result, ScopeError};
pub use hotkey::{Handlers, HotKey, HotKeyEntry, HotKeyMap, SequenceHandler, hotkey_map};
pub use matcher::{MatchCallback, Matcher, MatcherInstance};
pub use merge::{KeyMapMerger, MapUpdate, build_map};
pub use resolve::resolve;
pub use scope::{GateDecision, Scope, ScopeConfig, ScopeContext, ScopeHandle};
pub use target::{AttachTarget, BindTarget, ElementRef};
