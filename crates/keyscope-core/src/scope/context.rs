use super::ScopeInner;
use crate::hotkey::HotKeyMap;
use crate::matcher::Matcher;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Non-owning link to a scope, used for upward notification.
///
/// Once the scope is unmounted or dropped every operation on the handle is
/// a no-op.
pub struct ScopeHandle<M: Matcher> {
    pub(super) inner: Weak<ScopeInner<M>>,
}

impl<M: Matcher> ScopeHandle<M> {
    pub(super) fn new(inner: &Rc<ScopeInner<M>>) -> Self {
        Self {
            inner: Rc::downgrade(inner),
        }
    }

    /// A handle that never points at a scope.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub(super) fn live(&self) -> Option<Rc<ScopeInner<M>>> {
        self.inner
            .upgrade()
            .filter(|scope| scope.state.borrow().mounted)
    }

    pub fn is_live(&self) -> bool {
        self.live().is_some()
    }

    /// Record `sequence` as handled on this scope and every ancestor above it.
    ///
    /// `None` clears the record. Each write touches only `last_handled`.
    pub fn notify_handled(&self, sequence: Option<&str>) {
        let mut next = self.live();
        while let Some(scope) = next {
            trace!(scope = %scope.name, ?sequence, "delegation notify");
            scope.state.borrow_mut().last_handled = sequence.map(str::to_string);
            next = scope.parent.borrow().as_ref().and_then(ScopeHandle::live);
        }
    }
}

impl<M: Matcher> Clone for ScopeHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Immutable snapshot a scope hands to its children.
///
/// Children receive a fresh snapshot whenever the ancestor's merged map
/// changes, so each hop only needs the map directly above it.
pub struct ScopeContext<M: Matcher> {
    pub(super) ancestor: ScopeHandle<M>,
    pub(super) ancestor_map: Rc<HotKeyMap>,
}

impl<M: Matcher> ScopeContext<M> {
    pub fn ancestor(&self) -> &ScopeHandle<M> {
        &self.ancestor
    }

    pub fn ancestor_map(&self) -> &Rc<HotKeyMap> {
        &self.ancestor_map
    }
}

impl<M: Matcher> Clone for ScopeContext<M> {
    fn clone(&self) -> Self {
        Self {
            ancestor: self.ancestor.clone(),
            ancestor_map: self.ancestor_map.clone(),
        }
    }
}
