//! In-memory matcher used by unit tests.

use crate::error::BindingError;
use crate::matcher::{MatchCallback, Matcher, MatcherInstance};
use crate::target::BindTarget;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

struct FakeBinding {
    sequence: String,
    action: Option<String>,
    callback: MatchCallback<()>,
}

struct FakeInstanceState {
    target: String,
    bindings: Vec<FakeBinding>,
    resets: usize,
}

pub(crate) struct FakeInstance {
    state: Rc<RefCell<FakeInstanceState>>,
}

impl MatcherInstance for FakeInstance {
    type Event = ();

    fn bind(
        &mut self,
        sequence: &str,
        callback: MatchCallback<()>,
        action: Option<&str>,
    ) -> Result<(), BindingError> {
        if sequence.starts_with('!') {
            return Err(BindingError::InvalidSequence {
                sequence: sequence.to_string(),
                reason: "rejected by fake matcher".to_string(),
            });
        }
        self.state.borrow_mut().bindings.push(FakeBinding {
            sequence: sequence.to_string(),
            action: action.map(str::to_string),
            callback,
        });
        Ok(())
    }

    fn reset(&mut self) {
        let mut state = self.state.borrow_mut();
        state.bindings.clear();
        state.resets += 1;
    }
}

/// Targets are plain names; boundaries are named by their id.
#[derive(Default)]
pub(crate) struct FakeMatcher {
    instances: RefCell<Vec<Weak<RefCell<FakeInstanceState>>>>,
}

impl Matcher for FakeMatcher {
    type Event = ();
    type Element = &'static str;
    type Instance = FakeInstance;

    fn bind(&self, target: BindTarget<&'static str>) -> Result<FakeInstance, BindingError> {
        let target = match target {
            BindTarget::Element("missing") => {
                return Err(BindingError::Target {
                    target: "missing".to_string(),
                    reason: "no such element".to_string(),
                });
            }
            BindTarget::Element(name) => name.to_string(),
            BindTarget::Boundary(boundary) => boundary.id().to_string(),
        };
        let state = Rc::new(RefCell::new(FakeInstanceState {
            target,
            bindings: Vec::new(),
            resets: 0,
        }));
        self.instances.borrow_mut().push(Rc::downgrade(&state));
        Ok(FakeInstance { state })
    }
}

impl FakeMatcher {
    fn live(&self, target: &str) -> Vec<Rc<RefCell<FakeInstanceState>>> {
        self.instances
            .borrow()
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .filter(|state| state.borrow().target == target)
            .collect()
    }

    pub(crate) fn live_instances(&self, target: &str) -> usize {
        self.live(target).len()
    }

    pub(crate) fn bound_sequences(&self, target: &str) -> Vec<String> {
        self.live(target)
            .iter()
            .flat_map(|state| {
                state
                    .borrow()
                    .bindings
                    .iter()
                    .map(|b| b.sequence.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub(crate) fn bound_actions(&self, target: &str) -> Vec<Option<String>> {
        self.live(target)
            .iter()
            .flat_map(|state| {
                state
                    .borrow()
                    .bindings
                    .iter()
                    .map(|b| b.action.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub(crate) fn resets(&self, target: &str) -> usize {
        self.live(target).iter().map(|state| state.borrow().resets).sum()
    }

    /// Deliver `sequence` to listeners on `targets`, innermost first.
    ///
    /// Returns how many callbacks were invoked.
    pub(crate) fn press(&self, targets: &[&str], sequence: &str) -> usize {
        let callbacks: Vec<MatchCallback<()>> = targets
            .iter()
            .flat_map(|target| self.live(target))
            .flat_map(|state| {
                state
                    .borrow()
                    .bindings
                    .iter()
                    .filter(|b| b.sequence == sequence)
                    .map(|b| b.callback.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        for callback in &callbacks {
            callback(Some(&()), sequence);
        }
        callbacks.len()
    }
}
