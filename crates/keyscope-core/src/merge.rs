//! Key map merging between a scope and its nearest ancestor.

use crate::hotkey::HotKeyMap;
use std::rc::Rc;

/// Overlay `local` on top of `ancestor`.
///
/// A local entry replaces the ancestor's entry for the same action name as
/// a whole; names only the ancestor defines are inherited verbatim.
pub fn build_map(ancestor: Option<&HotKeyMap>, local: &HotKeyMap) -> HotKeyMap {
    let mut merged = ancestor.cloned().unwrap_or_default();
    for (name, entry) in local {
        merged.insert(name.clone(), entry.clone());
    }
    merged
}

/// Outcome of [`KeyMapMerger::update_map`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapUpdate {
    Changed,
    Unchanged,
}

impl MapUpdate {
    pub fn is_changed(self) -> bool {
        self == MapUpdate::Changed
    }
}

/// Caches a scope's merged map and reports when it actually changes.
#[derive(Debug, Clone)]
pub struct KeyMapMerger {
    merged: Rc<HotKeyMap>,
}

impl KeyMapMerger {
    pub fn new(ancestor: Option<&HotKeyMap>, local: &HotKeyMap) -> Self {
        Self {
            merged: Rc::new(build_map(ancestor, local)),
        }
    }

    /// Rebuild and compare against the cached map.
    ///
    /// The cache is only replaced when the new map differs structurally, so
    /// repeated calls with the same inputs keep returning `Unchanged`.
    pub fn update_map(&mut self, ancestor: Option<&HotKeyMap>, local: &HotKeyMap) -> MapUpdate {
        let next = build_map(ancestor, local);
        if *self.merged == next {
            MapUpdate::Unchanged
        } else {
            self.merged = Rc::new(next);
            MapUpdate::Changed
        }
    }

    pub fn merged(&self) -> &Rc<HotKeyMap> {
        &self.merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{HotKey, HotKeyEntry, hotkey_map};

    #[test]
    fn descendant_entry_wins_and_ancestor_only_entries_are_inherited() {
        let ancestor = hotkey_map([("x", "a"), ("y", "b")]);
        let local = hotkey_map([("x", "c")]);

        let merged = build_map(Some(&ancestor), &local);
        assert_eq!(merged["x"], HotKeyEntry::from("c"));
        assert_eq!(merged["y"], HotKeyEntry::from("b"));
    }

    #[test]
    fn replacement_is_whole_value() {
        let mut ancestor = HotKeyMap::new();
        ancestor.insert("x".into(), HotKeyEntry::from(["a", "b"]));
        let local = hotkey_map([("x", "c")]);

        let merged = build_map(Some(&ancestor), &local);
        assert_eq!(merged["x"], HotKeyEntry::One(HotKey::from("c")));
    }

    #[test]
    fn root_scope_uses_local_map() {
        let local = hotkey_map([("x", "c")]);
        assert_eq!(build_map(None, &local), local);
    }

    #[test]
    fn update_map_reports_unchanged_for_same_inputs() {
        let ancestor = hotkey_map([("y", "b")]);
        let local = hotkey_map([("x", "a")]);
        let mut merger = KeyMapMerger::new(Some(&ancestor), &local);
        let before = merger.merged().clone();

        assert_eq!(merger.update_map(Some(&ancestor), &local), MapUpdate::Unchanged);
        assert_eq!(merger.update_map(Some(&ancestor), &local), MapUpdate::Unchanged);
        assert!(Rc::ptr_eq(&before, merger.merged()));
    }

    #[test]
    fn update_map_reports_changed_on_ancestor_change() {
        let local = hotkey_map([("x", "a")]);
        let mut merger = KeyMapMerger::new(None, &local);

        let ancestor = hotkey_map([("y", "b")]);
        assert_eq!(merger.update_map(Some(&ancestor), &local), MapUpdate::Changed);
        assert_eq!(merger.merged()["y"], HotKeyEntry::from("b"));
        assert_eq!(merger.update_map(Some(&ancestor), &local), MapUpdate::Unchanged);
    }
}
