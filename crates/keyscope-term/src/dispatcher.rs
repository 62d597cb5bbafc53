//! Region tree, focus tracking and sequence matching for crossterm events.
//!
//! A [`KeyDispatcher`] models the places a scope can listen on as a tree of
//! regions rooted at [`RegionId::WINDOW`]. Exactly one region is focused.
//! A key event is offered to every live binding on the focused region's
//! chain, innermost region first, so that nested scopes see it before
//! their ancestors.
//!
//! Bindings made on a [`FocusBoundary`] follow the boundary: they wait until
//! the boundary is placed in a region and move with it if it is placed again.

use crate::combo::KeyCombo;
use crate::sequence::{KeySequence, Trigger, parse_trigger};
use crossterm::event::{KeyEvent, KeyEventKind};
use keyscope_core::{
    BindTarget, BindingError, BoundaryId, FocusBoundary, MatchCallback, Matcher, MatcherInstance,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

/// How long a partially typed sequence waits for its next key.
pub const SEQUENCE_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    /// The root region. Always present, never removed.
    pub const WINDOW: RegionId = RegionId(0);
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == RegionId::WINDOW {
            f.write_str("window")
        } else {
            write!(f, "region#{}", self.0)
        }
    }
}

struct Binding {
    sequence: KeySequence,
    display: String,
    trigger: Trigger,
    callback: MatchCallback<KeyEvent>,
}

#[derive(Default)]
struct InstanceState {
    bindings: Vec<Binding>,
}

/// A registered instance and, for boundary bindings, the boundary it follows.
struct Entry {
    instance: Weak<RefCell<InstanceState>>,
    boundary: Option<BoundaryId>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.instance.strong_count() > 0
    }
}

struct Region {
    parent: Option<RegionId>,
    boundary: Option<FocusBoundary>,
    instances: Vec<Entry>,
}

impl Region {
    fn new(parent: Option<RegionId>) -> Self {
        Self {
            parent,
            boundary: None,
            instances: Vec::new(),
        }
    }
}

struct DispatcherState {
    regions: HashMap<RegionId, Region>,
    next_id: u64,
    focused: RegionId,
    unplaced: Vec<Entry>,
    pending: Vec<KeyEvent>,
    pending_since: Option<Instant>,
    timeout: Duration,
}

impl DispatcherState {
    fn region(&self, id: RegionId) -> Result<&Region, BindingError> {
        self.regions.get(&id).ok_or_else(|| BindingError::Target {
            target: id.to_string(),
            reason: "no such region".to_string(),
        })
    }

    /// `id` and its ancestors, innermost first.
    fn chain(&self, id: RegionId) -> Vec<RegionId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(region) = self.regions.get(&current) else {
                break;
            };
            chain.push(current);
            cursor = region.parent;
        }
        chain
    }

    fn boundaries(&self, ids: &[RegionId]) -> Vec<FocusBoundary> {
        ids.iter()
            .filter_map(|id| self.regions.get(id).and_then(|region| region.boundary.clone()))
            .collect()
    }

    fn clear_pending(&mut self) {
        self.pending.clear();
        self.pending_since = None;
    }
}

/// Terminal implementation of the matcher capability.
pub struct KeyDispatcher {
    state: RefCell<DispatcherState>,
}

impl KeyDispatcher {
    pub fn new() -> Self {
        let mut regions = HashMap::new();
        regions.insert(RegionId::WINDOW, Region::new(None));
        Self {
            state: RefCell::new(DispatcherState {
                regions,
                next_id: 1,
                focused: RegionId::WINDOW,
                unplaced: Vec::new(),
                pending: Vec::new(),
                pending_since: None,
                timeout: SEQUENCE_TIMEOUT,
            }),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.state.borrow_mut().timeout = timeout;
        self
    }

    pub fn add_region(&self, parent: RegionId) -> Result<RegionId, BindingError> {
        let mut state = self.state.borrow_mut();
        state.region(parent)?;
        let id = RegionId(state.next_id);
        state.next_id += 1;
        state.regions.insert(id, Region::new(Some(parent)));
        tracing::trace!(%id, %parent, "region added");
        Ok(id)
    }

    /// Make `boundary` the focus boundary rendered by `region`. Instances
    /// bound to the boundary start receiving keys from `region`; instances
    /// bound to a boundary it replaces stop until that one is placed again.
    pub fn place_boundary(&self, region: RegionId, boundary: &FocusBoundary) -> Result<(), BindingError> {
        let mut state = self.state.borrow_mut();
        state.region(region)?;
        let id = boundary.id();

        let mut moved: Vec<Entry> = Vec::new();
        let (unplaced, waiting): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut state.unplaced)
            .into_iter()
            .filter(Entry::is_live)
            .partition(|entry| entry.boundary != Some(id));
        state.unplaced = unplaced;
        moved.extend(waiting);

        let mut replaced: Vec<Entry> = Vec::new();
        for (region_id, node) in state.regions.iter_mut() {
            let previous = node.boundary.as_ref().map(FocusBoundary::id);
            let (keep, taken): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut node.instances)
                .into_iter()
                .filter(Entry::is_live)
                .partition(|entry| entry.boundary != Some(id));
            node.instances = keep;
            moved.extend(taken);
            if *region_id != region && previous == Some(id) {
                node.boundary = None;
            }
            if *region_id == region && previous.is_some_and(|previous| previous != id) {
                let (keep, displaced): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut node.instances)
                    .into_iter()
                    .partition(|entry| entry.boundary != previous);
                node.instances = keep;
                replaced.extend(displaced);
            }
        }
        state.unplaced.extend(replaced);

        if let Some(node) = state.regions.get_mut(&region) {
            node.boundary = Some(boundary.clone());
            node.instances.extend(moved);
        }
        tracing::trace!(%region, boundary = %id, "boundary placed");
        Ok(())
    }

    /// Remove `region` and everything below it. Focus inside the removed
    /// subtree moves to the region's parent.
    pub fn remove_region(&self, region: RegionId) {
        if region == RegionId::WINDOW {
            return;
        }
        let parent = {
            let state = self.state.borrow();
            let Some(entry) = state.regions.get(&region) else {
                return;
            };
            let parent = entry.parent.unwrap_or(RegionId::WINDOW);
            if state.chain(state.focused).contains(&region) {
                Some(parent)
            } else {
                None
            }
        };
        if let Some(parent) = parent {
            self.set_focus(parent);
        }

        let mut state = self.state.borrow_mut();
        let mut doomed = vec![region];
        let mut index = 0;
        while index < doomed.len() {
            let current = doomed[index];
            doomed.extend(
                state
                    .regions
                    .iter()
                    .filter(|(_, r)| r.parent == Some(current))
                    .map(|(id, _)| *id),
            );
            index += 1;
        }
        for id in doomed {
            if let Some(removed) = state.regions.remove(&id) {
                let orphans = removed
                    .instances
                    .into_iter()
                    .filter(|entry| entry.boundary.is_some() && entry.is_live());
                state.unplaced.extend(orphans);
            }
        }
        tracing::trace!(%region, "region removed");
    }

    pub fn focused(&self) -> RegionId {
        self.state.borrow().focused
    }

    pub fn region_of(&self, boundary: &FocusBoundary) -> Option<RegionId> {
        self.state
            .borrow()
            .regions
            .iter()
            .find(|(_, region)| region.boundary.as_ref().is_some_and(|b| b.same_node(boundary)))
            .map(|(id, _)| *id)
    }

    /// Move focus to `region`. Boundaries that lose focus are blurred
    /// innermost first, then boundaries that gain it are focused outermost
    /// first. Unknown regions are ignored.
    pub fn set_focus(&self, region: RegionId) {
        let (blurred, focused) = {
            let mut state = self.state.borrow_mut();
            if !state.regions.contains_key(&region) || state.focused == region {
                return;
            }
            let old_chain = state.chain(state.focused);
            let new_chain = state.chain(region);
            let leaving: Vec<RegionId> = old_chain.iter().copied().filter(|id| !new_chain.contains(id)).collect();
            let entering: Vec<RegionId> = new_chain
                .iter()
                .rev()
                .copied()
                .filter(|id| !old_chain.contains(id))
                .collect();
            tracing::debug!(from = %state.focused, to = %region, "focus moved");
            state.focused = region;
            state.clear_pending();
            (state.boundaries(&leaving), state.boundaries(&entering))
        };
        for boundary in blurred {
            boundary.blur();
        }
        for boundary in focused {
            boundary.focus();
        }
    }

    pub fn dispatch(&self, event: &KeyEvent) -> usize {
        self.dispatch_at(event, Instant::now())
    }

    /// Offer `event` to the focused chain. Returns how many callbacks ran.
    ///
    /// Press events extend a pending prefix while some binding is still
    /// waiting for more keys; release and repeat events only complete
    /// single-key bindings. Callbacks run after the dispatcher's own state
    /// is released, so they may rebind, move focus or add regions.
    pub fn dispatch_at(&self, event: &KeyEvent, now: Instant) -> usize {
        let matched = {
            let mut state = self.state.borrow_mut();
            if let Some(since) = state.pending_since
                && now.duration_since(since) > state.timeout
            {
                state.clear_pending();
            }
            for region in state.regions.values_mut() {
                region.instances.retain(Entry::is_live);
            }
            state.unplaced.retain(Entry::is_live);

            let advancing = event.kind == KeyEventKind::Press;
            let chain = state.chain(state.focused);
            let mut keys: Vec<KeyEvent> = if advancing { state.pending.clone() } else { Vec::new() };
            keys.push(*event);

            let mut scan = collect(&state, &chain, &keys, event.kind, advancing);
            if scan.complete.is_empty() && !scan.partial && keys.len() > 1 {
                keys = vec![*event];
                scan = collect(&state, &chain, &keys, event.kind, advancing);
            }

            if advancing {
                if scan.partial {
                    state.pending = keys;
                    state.pending_since = Some(now);
                } else {
                    state.clear_pending();
                }
            }
            scan.complete
        };

        let fired = matched.len();
        for (callback, sequence) in matched {
            tracing::trace!(%sequence, "sequence matched");
            callback(Some(event), &sequence);
        }
        fired
    }
}

impl Default for KeyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

struct Scan {
    complete: Vec<(MatchCallback<KeyEvent>, String)>,
    partial: bool,
}

fn collect(state: &DispatcherState, chain: &[RegionId], keys: &[KeyEvent], kind: KeyEventKind, advancing: bool) -> Scan {
    let mut scan = Scan {
        complete: Vec::new(),
        partial: false,
    };
    for id in chain {
        let Some(region) = state.regions.get(id) else {
            continue;
        };
        for instance in region.instances.iter().rev().filter_map(|entry| entry.instance.upgrade()) {
            let instance = instance.borrow();
            for binding in &instance.bindings {
                if !binding.trigger.accepts(kind) {
                    continue;
                }
                let sequence = &binding.sequence;
                let len = keys.len();
                if sequence.len() < len || !prefix_matches(&sequence.combos()[..len], keys) {
                    continue;
                }
                if sequence.len() == len {
                    scan.complete.push((binding.callback.clone(), binding.display.clone()));
                } else if advancing {
                    scan.partial = true;
                }
            }
        }
    }
    scan
}

fn prefix_matches(combos: &[KeyCombo], keys: &[KeyEvent]) -> bool {
    combos.iter().zip(keys).all(|(combo, key)| combo.matches(key))
}

impl Matcher for KeyDispatcher {
    type Event = KeyEvent;
    type Element = RegionId;
    type Instance = TermInstance;

    /// Element targets must name an existing region. Boundary targets
    /// always succeed; they receive keys once the boundary is placed.
    fn bind(&self, target: BindTarget<RegionId>) -> Result<TermInstance, BindingError> {
        let instance = Rc::new(RefCell::new(InstanceState::default()));
        let (region, boundary) = match &target {
            BindTarget::Element(id) => {
                self.state.borrow().region(*id)?;
                (Some(*id), None)
            }
            BindTarget::Boundary(boundary) => (self.region_of(boundary), Some(boundary.id())),
        };
        let entry = Entry {
            instance: Rc::downgrade(&instance),
            boundary,
        };

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        match region.and_then(|id| state.regions.get_mut(&id)) {
            Some(node) => node.instances.push(entry),
            None => state.unplaced.push(entry),
        }
        match region {
            Some(region) => tracing::debug!(%region, "matcher instance attached"),
            None => tracing::debug!("matcher instance waiting for its boundary to be placed"),
        }
        Ok(TermInstance { state: instance })
    }
}

impl KeyDispatcher {
    /// Live instances currently receiving keys from `region`.
    pub fn instances_in(&self, region: RegionId) -> usize {
        self.state
            .borrow()
            .regions
            .get(&region)
            .map_or(0, |node| node.instances.iter().filter(|entry| entry.is_live()).count())
    }
}

/// Bindings registered through one [`KeyDispatcher::bind`] call. Dropping it
/// unregisters them all.
pub struct TermInstance {
    state: Rc<RefCell<InstanceState>>,
}

impl TermInstance {
    pub fn len(&self) -> usize {
        self.state.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().bindings.is_empty()
    }
}

impl MatcherInstance for TermInstance {
    type Event = KeyEvent;

    /// Callbacks receive the canonical spelling of the sequence, so
    /// `"ctrl-s"` and `"C-s"` report the same value.
    fn bind(
        &mut self,
        sequence: &str,
        callback: MatchCallback<KeyEvent>,
        action: Option<&str>,
    ) -> Result<(), BindingError> {
        let trigger = parse_trigger(sequence, action)?;
        let parsed = KeySequence::parse(sequence)?;
        let display = parsed.to_string();
        self.state.borrow_mut().bindings.push(Binding {
            sequence: parsed,
            display,
            trigger,
            callback,
        });
        Ok(())
    }

    fn reset(&mut self) {
        self.state.borrow_mut().bindings.clear();
    }
}
