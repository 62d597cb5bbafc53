//! Scopes: tree nodes that own a key map, handlers and focus state.
//!
//! A scope merges its map with its nearest ancestor's, binds every handler
//! through a matcher instance, and gates each fired sequence on focus and on
//! whether a descendant already handled that sequence value. Firing marks the
//! sequence as handled on every ancestor before the handler runs, so nested
//! scopes listening on overlapping regions react at most once per sequence.

mod config;
mod context;
mod state;

pub use config::ScopeConfig;
pub use context::{ScopeContext, ScopeHandle};
pub use state::GateDecision;

use crate::binding::BindingSynchronizer;
use crate::boundary::{FocusBoundary, FocusCallback};
use crate::error::{Result, ScopeError};
use crate::hotkey::{Handlers, HotKey, HotKeyMap, SequenceHandler};
use crate::matcher::{MatchCallback, Matcher};
use crate::resolve::resolve;
use crate::target::AttachTarget;
use state::ScopeState;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

pub(crate) struct ScopeInner<M: Matcher> {
    name: String,
    matcher: Rc<M>,
    boundary: FocusBoundary,
    state: RefCell<ScopeState<M::Event>>,
    target: RefCell<AttachTarget<M::Element>>,
    bindings: RefCell<BindingSynchronizer<M>>,
    parent: RefCell<Option<ScopeHandle<M>>>,
    children: RefCell<Vec<Weak<ScopeInner<M>>>>,
    passthrough: RefCell<Passthrough>,
}

#[derive(Default)]
struct Passthrough {
    on_focus: Option<FocusCallback>,
    on_blur: Option<FocusCallback>,
}

/// A mounted routing boundary.
///
/// Cloning yields another handle to the same scope. Dropping the last handle
/// of a mounted scope unmounts it.
pub struct Scope<M: Matcher> {
    inner: Rc<ScopeInner<M>>,
}

impl<M: Matcher> Clone for Scope<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Matcher + 'static> Scope<M> {
    /// Mount a scope below `parent` (or as a root).
    ///
    /// Validates the bind target, merges maps, attaches a matcher instance and
    /// binds every handler.
    pub fn mount(matcher: Rc<M>, parent: Option<&ScopeContext<M>>, config: ScopeConfig<M>) -> Result<Self> {
        let target = config.target()?;
        let ScopeConfig {
            name,
            key_map,
            handlers,
            focused,
            host,
            on_focus,
            on_blur,
            ..
        } = config;

        let ancestor_map = parent.map(|ctx| ctx.ancestor_map.clone());
        let state = ScopeState::new(key_map, ancestor_map, handlers, focused);

        let inner = Rc::new_cyclic(|weak: &Weak<ScopeInner<M>>| {
            let on_focus_scope = weak.clone();
            let on_blur_scope = weak.clone();
            let boundary = FocusBoundary::builder()
                .host(host)
                .on_focus(move || {
                    if let Some(scope) = on_focus_scope.upgrade() {
                        scope.focus();
                    }
                })
                .on_blur(move || {
                    if let Some(scope) = on_blur_scope.upgrade() {
                        scope.blur();
                    }
                })
                .build();
            ScopeInner {
                name,
                matcher,
                boundary,
                state: RefCell::new(state),
                target: RefCell::new(target),
                bindings: RefCell::new(BindingSynchronizer::new()),
                parent: RefCell::new(None),
                children: RefCell::new(Vec::new()),
                passthrough: RefCell::new(Passthrough { on_focus, on_blur }),
            }
        });

        let target = inner.target.borrow().clone();
        inner.attach(target)?;
        inner.state.borrow_mut().mounted = true;
        if let Some(ctx) = parent {
            if let Some(ancestor) = ctx.ancestor.live() {
                ancestor.children.borrow_mut().push(Rc::downgrade(&inner));
            }
            *inner.parent.borrow_mut() = Some(ctx.ancestor.clone());
        }
        inner.refresh()?;
        debug!(scope = %inner.name, boundary = %inner.boundary.id(), "mounted scope");

        Ok(Self { inner })
    }

    /// Snapshot handed to child scopes at mount.
    pub fn context(&self) -> ScopeContext<M> {
        self.inner.context()
    }

    pub fn handle(&self) -> ScopeHandle<M> {
        ScopeHandle::new(&self.inner)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The boundary that wraps this scope's content.
    pub fn boundary(&self) -> &FocusBoundary {
        &self.inner.boundary
    }

    pub fn set_key_map(&self, key_map: HotKeyMap) -> Result<()> {
        self.inner.ensure_mounted()?;
        self.inner.state.borrow_mut().local_map = key_map;
        self.inner.refresh()
    }

    pub fn set_handlers(&self, handlers: Handlers<M::Event>) -> Result<()> {
        self.inner.ensure_mounted()?;
        self.inner.state.borrow_mut().handlers = handlers;
        self.inner.refresh()
    }

    /// Replace or remove a single handler, keeping the others.
    pub fn set_handler(&self, name: &str, handler: Option<SequenceHandler<M::Event>>) -> Result<()> {
        self.inner.ensure_mounted()?;
        {
            let mut state = self.inner.state.borrow_mut();
            match handler {
                Some(handler) => state.handlers.insert(name, handler),
                None => {
                    state.handlers.remove(name);
                }
            }
        }
        self.inner.refresh()
    }

    /// Force focus on or off, or hand control back to focus observation.
    pub fn set_focused(&self, focused: Option<bool>) {
        self.inner.state.borrow_mut().forced_focus = focused;
    }

    /// Apply a new configuration.
    ///
    /// The host element is fixed for the life of the boundary and is ignored.
    /// A different bind target replaces the matcher instance; if the new
    /// target cannot be resolved or bound, the scope keeps listening on the
    /// old one and a later update retries.
    pub fn update(&self, config: ScopeConfig<M>) -> Result<()> {
        self.inner.ensure_mounted()?;
        let target = config.target()?;
        let ScopeConfig {
            key_map,
            handlers,
            focused,
            on_focus,
            on_blur,
            ..
        } = config;

        *self.inner.passthrough.borrow_mut() = Passthrough { on_focus, on_blur };
        {
            let mut state = self.inner.state.borrow_mut();
            state.local_map = key_map;
            state.handlers = handlers;
            state.forced_focus = focused;
        }

        let retarget = *self.inner.target.borrow() != target;
        if retarget {
            debug!(scope = %self.inner.name, "bind target changed, replacing matcher instance");
            self.inner.attach(target)?;
        }
        self.inner.refresh()
    }

    /// Observed focus gained.
    pub fn focus(&self) {
        self.inner.focus();
    }

    /// Observed focus lost; clears delegation state up the ancestor chain.
    pub fn blur(&self) {
        self.inner.blur();
    }

    /// Tear down: clear delegation state upward, release bindings, detach.
    pub fn unmount(&self) {
        self.inner.teardown();
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted()
    }

    /// Effective focus: forced if set, else observed.
    pub fn is_focused(&self) -> bool {
        self.inner.state.borrow().effective_focus()
    }

    pub fn last_handled(&self) -> Option<String> {
        self.inner.state.borrow().last_handled.clone()
    }

    pub fn merged_map(&self) -> Rc<HotKeyMap> {
        self.inner.state.borrow().merger.merged().clone()
    }

    /// Sequences an action name currently resolves to in this scope.
    pub fn resolve(&self, action_name: &str) -> Vec<HotKey> {
        resolve(self.inner.state.borrow().merger.merged(), action_name)
    }

    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().binding_count()
    }

    /// Run the focus gate for `sequence` without firing anything.
    pub fn gate(&self, sequence: &str) -> GateDecision {
        self.inner.state.borrow().gate(sequence)
    }
}

impl<M: Matcher + 'static> ScopeInner<M> {
    fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(ScopeError::Configuration(format!(
                "scope '{}' is not mounted",
                self.name
            )))
        }
    }

    fn context(self: &Rc<Self>) -> ScopeContext<M> {
        ScopeContext {
            ancestor: ScopeHandle::new(self),
            ancestor_map: self.state.borrow().merger.merged().clone(),
        }
    }

    /// Attach a fresh matcher instance for `target`.
    ///
    /// The target is resolved before the current instance is released, and
    /// it is recorded only once the matcher accepted it.
    fn attach(&self, target: AttachTarget<M::Element>) -> Result<()> {
        let bind_target = target.resolve(&self.boundary)?;
        self.bindings
            .borrow_mut()
            .attach(&self.matcher, bind_target)?;
        *self.target.borrow_mut() = target;
        Ok(())
    }

    /// Re-merge, rebind when stale, and push a new snapshot to children when
    /// the merged map changed.
    ///
    /// Children receive the new map even when this scope's own rebind fails.
    /// The first error is returned after every step has run.
    fn refresh(self: &Rc<Self>) -> Result<()> {
        let (map_update, local, merged, handlers, push) = {
            let mut state = self.state.borrow_mut();
            let map_update = state.update_map();
            if map_update.is_changed() {
                state.children_stale = true;
            }
            (
                map_update,
                state.local_map.clone(),
                state.merger.merged().clone(),
                state.handlers.clone(),
                state.children_stale,
            )
        };

        let stale = self
            .bindings
            .borrow()
            .is_stale(&local, map_update, &handlers);
        let rebound = if stale {
            debug!(scope = %self.name, ?map_update, "rebinding");
            let weak = Rc::downgrade(self);
            self.bindings
                .borrow_mut()
                .rebuild(&local, &merged, &handlers, |action, handler| {
                    gated(weak.clone(), action, handler)
                })
                .map(drop)
        } else {
            Ok(())
        };

        let propagated = if push { self.propagate(merged) } else { Ok(()) };
        rebound?;
        propagated
    }

    /// Re-deliver this scope's merged map to every live child.
    ///
    /// Every child is refreshed even if an earlier one fails; the pending
    /// flag is cleared only once all of them succeeded.
    fn propagate(&self, merged: Rc<HotKeyMap>) -> Result<()> {
        let children: Vec<Rc<ScopeInner<M>>> = {
            let mut children = self.children.borrow_mut();
            children.retain(|child| child.upgrade().is_some_and(|c| c.is_mounted()));
            children.iter().filter_map(Weak::upgrade).collect()
        };
        let mut first_error = None;
        for child in children {
            trace!(scope = %self.name, child = %child.name, "propagating merged map");
            child.state.borrow_mut().ancestor_map = Some(merged.clone());
            if let Err(err) = child.refresh() {
                debug!(scope = %self.name, child = %child.name, %err, "child refresh failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => {
                self.state.borrow_mut().children_stale = false;
                Ok(())
            }
        }
    }

    fn parent_handle(&self) -> Option<ScopeHandle<M>> {
        self.parent.borrow().clone()
    }

    fn focus(&self) {
        if !self.state.borrow().mounted {
            return;
        }
        self.state.borrow_mut().observed_focus = true;
        trace!(scope = %self.name, "focus");
        let callback = self.passthrough.borrow().on_focus.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn blur(&self) {
        if !self.state.borrow().mounted {
            return;
        }
        self.state.borrow_mut().observed_focus = false;
        trace!(scope = %self.name, "blur");
        if let Some(parent) = self.parent_handle() {
            parent.notify_handled(None);
        }
        let callback = self.passthrough.borrow().on_blur.clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn teardown(&self) {
        if !self.state.borrow().mounted {
            return;
        }
        if let Some(parent) = self.parent_handle() {
            parent.notify_handled(None);
        }
        self.bindings.borrow_mut().release();
        {
            let mut state = self.state.borrow_mut();
            state.mounted = false;
            state.observed_focus = false;
            state.last_handled = None;
        }
        self.parent.borrow_mut().take();
        debug!(scope = %self.name, "unmounted scope");
    }
}

impl<M: Matcher> Drop for ScopeInner<M> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if !state.mounted {
            return;
        }
        state.mounted = false;
        if let Some(parent) = self.parent.get_mut().take() {
            parent.notify_handled(None);
        }
        self.bindings.get_mut().release();
        debug!(scope = %self.name, "dropped mounted scope");
    }
}

/// Wrap `handler` in the focus gate and delegation protocol.
fn gated<M: Matcher + 'static>(
    scope: Weak<ScopeInner<M>>,
    action: &str,
    handler: SequenceHandler<M::Event>,
) -> MatchCallback<M::Event> {
    let action = action.to_string();
    Rc::new(move |event: Option<&M::Event>, sequence: &str| {
        let Some(scope) = scope.upgrade() else {
            return;
        };
        let decision = scope.state.borrow().gate(sequence);
        if decision != GateDecision::Fire {
            trace!(scope = %scope.name, %action, sequence, ?decision, "suppressed");
            return;
        }
        if let Some(parent) = scope.parent_handle() {
            parent.notify_handled(Some(sequence));
        }
        trace!(scope = %scope.name, %action, sequence, "firing handler");
        handler(event, sequence);
    })
}
