//! Expansion of action names into concrete sequences.

use crate::hotkey::{HotKey, HotKeyEntry, HotKeyMap};

/// Resolve `action_name` against a merged map.
///
/// A name with no entry is treated as a literal sequence, so handlers can be
/// registered directly under a key combo without declaring it in any map.
pub fn resolve(map: &HotKeyMap, action_name: &str) -> Vec<HotKey> {
    match map.get(action_name) {
        None => vec![HotKey::from(action_name)],
        Some(HotKeyEntry::Many(keys)) => keys.clone(),
        Some(HotKeyEntry::One(key)) => vec![key.clone()],
    }
}
