//! Keeps a scope's matcher bindings in step with its configuration.
//!
//! Any relevant change triggers a hard reset followed by a full rebuild.
//! There is no per-sequence diffing.

use crate::error::BindingError;
use crate::hotkey::{Handlers, HotKeyMap, SequenceHandler};
use crate::matcher::{MatchCallback, Matcher, MatcherInstance};
use crate::merge::MapUpdate;
use crate::resolve::resolve;
use crate::target::BindTarget;
use tracing::debug;

/// Owner of a scope's matcher instance.
pub struct BindingSynchronizer<M: Matcher> {
    instance: Option<M::Instance>,
    bound_local: Option<HotKeyMap>,
    bound_handlers: Option<Handlers<M::Event>>,
    bound_count: usize,
}

impl<M: Matcher> BindingSynchronizer<M> {
    pub fn new() -> Self {
        Self {
            instance: None,
            bound_local: None,
            bound_handlers: None,
            bound_count: 0,
        }
    }

    /// Attach to `target`, replacing any previous instance.
    ///
    /// The previous instance is only released once the matcher accepted the
    /// new target.
    pub fn attach(&mut self, matcher: &M, target: BindTarget<M::Element>) -> Result<(), BindingError> {
        let instance = matcher.bind(target)?;
        self.release();
        self.instance = Some(instance);
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.instance.is_some()
    }

    /// Number of sequences registered by the last successful rebuild.
    pub fn binding_count(&self) -> usize {
        self.bound_count
    }

    /// Whether the bindings no longer reflect `(local, merged, handlers)`.
    pub fn is_stale(&self, local: &HotKeyMap, map_update: MapUpdate, handlers: &Handlers<M::Event>) -> bool {
        map_update.is_changed()
            || self.bound_local.as_ref() != Some(local)
            || !self
                .bound_handlers
                .as_ref()
                .is_some_and(|bound| bound.same_as(handlers))
    }

    /// Reset the instance and register one binding per resolved sequence.
    ///
    /// `wrap` turns each `(action name, handler)` into the callback the matcher
    /// will invoke. A failed bind is returned as is and leaves the
    /// synchronizer stale so the next update retries from scratch.
    pub fn rebuild<F>(
        &mut self,
        local: &HotKeyMap,
        merged: &HotKeyMap,
        handlers: &Handlers<M::Event>,
        mut wrap: F,
    ) -> Result<usize, BindingError>
    where
        F: FnMut(&str, SequenceHandler<M::Event>) -> MatchCallback<M::Event>,
    {
        self.bound_local = None;
        self.bound_handlers = None;
        self.bound_count = 0;

        let Some(instance) = self.instance.as_mut() else {
            return Ok(0);
        };
        instance.reset();

        let mut count = 0;
        for (name, handler) in handlers.iter() {
            for key in resolve(merged, name) {
                let callback = wrap(name, handler.clone());
                instance.bind(key.sequence(), callback, key.action())?;
                count += 1;
            }
        }

        self.bound_local = Some(local.clone());
        self.bound_handlers = Some(handlers.clone());
        self.bound_count = count;
        debug!(bindings = count, "rebuilt matcher bindings");
        Ok(count)
    }

    /// Unbind everything and drop the instance.
    pub fn release(&mut self) {
        if let Some(mut instance) = self.instance.take() {
            instance.reset();
        }
        self.bound_local = None;
        self.bound_handlers = None;
        self.bound_count = 0;
    }
}

impl<M: Matcher> Default for BindingSynchronizer<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{HotKey, hotkey_map};
    use crate::testing::FakeMatcher;
    use std::cell::Cell;
    use std::rc::Rc;

    fn passthrough(_: &str, handler: SequenceHandler<()>) -> MatchCallback<()> {
        handler
    }

    #[test]
    fn rebuild_binds_every_resolved_sequence() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let local = hotkey_map([("save", ["C-s", "C-x C-s"])]);
        let handlers = Handlers::new().on("save", |_, _| {}).on("q", |_, _| {});
        let count = sync.rebuild(&local, &local, &handlers, passthrough).unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            matcher.bound_sequences("window"),
            vec!["q".to_string(), "C-s".to_string(), "C-x C-s".to_string()]
        );
    }

    #[test]
    fn rebuild_resets_before_binding() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let local = hotkey_map([("save", "C-s")]);
        let handlers = Handlers::new().on("save", |_, _| {});
        sync.rebuild(&local, &local, &handlers, passthrough).unwrap();
        sync.rebuild(&local, &local, &handlers, passthrough).unwrap();

        assert_eq!(matcher.resets("window"), 2);
        assert_eq!(matcher.bound_sequences("window"), vec!["C-s".to_string()]);
    }

    #[test]
    fn action_discriminator_reaches_the_matcher() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let local = hotkey_map([("peek", HotKey::tagged("p", "release"))]);
        let handlers = Handlers::new().on("peek", |_, _| {});
        sync.rebuild(&local, &local, &handlers, passthrough).unwrap();

        assert_eq!(matcher.bound_actions("window"), vec![Some("release".to_string())]);
    }

    #[test]
    fn staleness_tracks_local_map_and_handler_identity() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let local = hotkey_map([("save", "C-s")]);
        let handlers = Handlers::new().on("save", |_, _| {});
        assert!(sync.is_stale(&local, MapUpdate::Unchanged, &handlers));

        sync.rebuild(&local, &local, &handlers, passthrough).unwrap();
        assert!(!sync.is_stale(&local, MapUpdate::Unchanged, &handlers));
        assert!(sync.is_stale(&local, MapUpdate::Changed, &handlers));

        let other_local = hotkey_map([("save", "C-w")]);
        assert!(sync.is_stale(&other_local, MapUpdate::Unchanged, &handlers));

        let other_handlers = Handlers::new().on("save", |_, _| {});
        assert!(sync.is_stale(&local, MapUpdate::Unchanged, &other_handlers));
    }

    #[test]
    fn bind_failure_propagates_and_leaves_state_stale() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let local = hotkey_map([("broken", "!oops")]);
        let handlers = Handlers::new().on("broken", |_, _| {});
        let err = sync.rebuild(&local, &local, &handlers, passthrough).unwrap_err();

        assert!(matches!(err, BindingError::InvalidSequence { .. }));
        assert!(sync.is_stale(&local, MapUpdate::Unchanged, &handlers));
    }

    #[test]
    fn rejected_target_keeps_the_current_instance() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let err = sync.attach(&matcher, BindTarget::Element("missing")).unwrap_err();
        assert!(matches!(err, BindingError::Target { .. }));
        assert!(sync.is_attached());
        assert_eq!(matcher.live_instances("window"), 1);
    }

    #[test]
    fn release_unbinds_and_drops_instance() {
        let matcher = FakeMatcher::default();
        let mut sync = BindingSynchronizer::<FakeMatcher>::new();
        sync.attach(&matcher, BindTarget::Element("window")).unwrap();

        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let local = HotKeyMap::new();
        let handlers = Handlers::new().on("a", move |_, _| counter.set(counter.get() + 1));
        sync.rebuild(&local, &local, &handlers, passthrough).unwrap();
        assert_eq!(matcher.press(&["window"], "a"), 1);

        sync.release();
        assert!(!sync.is_attached());
        assert_eq!(sync.binding_count(), 0);
        assert_eq!(matcher.press(&["window"], "a"), 0);
        assert_eq!(fired.get(), 1);
    }
}
