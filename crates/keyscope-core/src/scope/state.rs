use crate::hotkey::{Handlers, HotKeyMap};
use crate::merge::{KeyMapMerger, MapUpdate};
use std::rc::Rc;

/// Per-scope mutable state.
///
/// Only the owning scope writes these fields, with one exception:
/// `last_handled` is also written by a descendant through the upward notify.
pub(crate) struct ScopeState<E> {
    pub local_map: HotKeyMap,
    /// Last merged map the ancestor exposed, if there is an ancestor.
    pub ancestor_map: Option<Rc<HotKeyMap>>,
    pub merger: KeyMapMerger,
    pub handlers: Handlers<E>,
    pub forced_focus: Option<bool>,
    pub observed_focus: bool,
    pub last_handled: Option<String>,
    pub mounted: bool,
    /// Set when the merged map changed and some child has not yet taken the
    /// new snapshot successfully.
    pub children_stale: bool,
}

impl<E> ScopeState<E> {
    pub fn new(
        local_map: HotKeyMap,
        ancestor_map: Option<Rc<HotKeyMap>>,
        handlers: Handlers<E>,
        forced_focus: Option<bool>,
    ) -> Self {
        let merger = KeyMapMerger::new(ancestor_map.as_deref(), &local_map);
        Self {
            local_map,
            ancestor_map,
            merger,
            handlers,
            forced_focus,
            observed_focus: false,
            last_handled: None,
            mounted: false,
            children_stale: false,
        }
    }

    pub fn update_map(&mut self) -> MapUpdate {
        self.merger
            .update_map(self.ancestor_map.as_deref(), &self.local_map)
    }

    pub fn effective_focus(&self) -> bool {
        self.forced_focus.unwrap_or(self.observed_focus)
    }

    /// Decide whether a fired sequence may run this scope's handler.
    pub fn gate(&self, sequence: &str) -> GateDecision {
        if !self.mounted {
            return GateDecision::Unmounted;
        }
        if !self.effective_focus() {
            return GateDecision::Unfocused;
        }
        if self.last_handled.as_deref() == Some(sequence) {
            return GateDecision::AlreadyHandled;
        }
        GateDecision::Fire
    }
}

/// Outcome of the focus gate for one fired sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Fire,
    /// Neither forced nor observed focus.
    Unfocused,
    /// A descendant already claimed this sequence value.
    AlreadyHandled,
    /// The scope was torn down while the callback was queued.
    Unmounted,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mounted_state() -> ScopeState<()> {
        let mut state = ScopeState::new(HotKeyMap::new(), None, Handlers::new(), None);
        state.mounted = true;
        state
    }

    #[test]
    fn forced_focus_overrides_observed_focus() {
        let mut state = mounted_state();
        state.observed_focus = true;
        state.forced_focus = Some(false);
        assert_eq!(state.gate("a"), GateDecision::Unfocused);

        state.observed_focus = false;
        state.forced_focus = Some(true);
        assert_eq!(state.gate("a"), GateDecision::Fire);
    }

    #[test]
    fn matching_last_handled_suppresses_only_that_sequence() {
        let mut state = mounted_state();
        state.observed_focus = true;
        state.last_handled = Some("a".to_string());
        assert_eq!(state.gate("a"), GateDecision::AlreadyHandled);
        assert_eq!(state.gate("b"), GateDecision::Fire);
    }

    #[test]
    fn unmounted_scope_never_fires() {
        let mut state = mounted_state();
        state.forced_focus = Some(true);
        state.mounted = false;
        assert_eq!(state.gate("a"), GateDecision::Unmounted);
    }
}
