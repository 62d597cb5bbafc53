use keyscope_core::{HotKey, HotKeyEntry, HotKeyMap, hotkey_map};

/// Scope names shipped with built-in maps.
pub const BUILTIN_SCOPES: [&str; 4] = ["app", "workspace", "list", "editor"];

pub(crate) fn builtin_map(scope: &str) -> HotKeyMap {
    match scope {
        "app" => hotkey_map([
            ("quit", HotKeyEntry::from(["C-q", "C-c"])),
            ("next_pane", HotKeyEntry::from("Tab")),
            ("prev_pane", HotKeyEntry::from("BackTab")),
            ("toggle_editor", HotKeyEntry::from("C-e")),
            ("help", HotKeyEntry::from(["?", "F1"])),
            ("cancel", HotKeyEntry::from("Esc")),
        ]),
        "workspace" => hotkey_map([
            ("refresh", HotKeyEntry::from("C-r")),
            ("cancel", HotKeyEntry::from("Esc")),
        ]),
        "list" => hotkey_map([
            ("up", HotKeyEntry::from(["k", "Up"])),
            ("down", HotKeyEntry::from(["j", "Down"])),
            ("top", HotKeyEntry::from("g g")),
            ("bottom", HotKeyEntry::from("G")),
            ("open", HotKeyEntry::from("Enter")),
        ]),
        "editor" => hotkey_map([
            ("save", HotKeyEntry::from(HotKey::tagged("C-s", "press"))),
            ("close", HotKeyEntry::from("Esc")),
        ]),
        _ => HotKeyMap::new(),
    }
}

pub(crate) fn is_builtin_scope(name: &str) -> bool {
    BUILTIN_SCOPES.contains(&name)
}
