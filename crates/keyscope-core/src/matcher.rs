//! The capability the scope tree needs from a low-level key-sequence matcher.
//!
//! The core never looks at raw key events. It only asks a matcher to attach
//! to a target, register sequence callbacks and drop everything again.

use crate::error::BindingError;
use crate::target::BindTarget;
use std::fmt;
use std::rc::Rc;

/// Callback the matcher invokes, synchronously, when a sequence matches.
pub type MatchCallback<E> = Rc<dyn Fn(Option<&E>, &str)>;

pub trait Matcher {
    /// Raw event passed through to handlers.
    type Event: 'static;
    /// Something the matcher can listen on (an element, a window, a region).
    type Element: Clone + PartialEq + fmt::Debug;
    type Instance: MatcherInstance<Event = Self::Event>;

    /// Create a binding set listening on `target`.
    fn bind(&self, target: BindTarget<Self::Element>) -> Result<Self::Instance, BindingError>;
}

/// A binding set owned by exactly one scope.
///
/// Dropping the instance must release everything it registered.
pub trait MatcherInstance {
    type Event;

    /// Register `callback` for `sequence`, optionally restricted to a trigger.
    fn bind(
        &mut self,
        sequence: &str,
        callback: MatchCallback<Self::Event>,
        action: Option<&str>,
    ) -> Result<(), BindingError>;

    /// Unbind everything.
    fn reset(&mut self);
}
