//! Per-scope key maps loaded from `keymaps.toml`.

mod defaults;
mod parse;

pub use defaults::BUILTIN_SCOPES;
pub use parse::load_key_maps;

use keyscope_core::HotKeyMap;
use std::collections::BTreeMap;

/// Key maps for every named scope, as configured by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyMapSet {
    description: Option<String>,
    scopes: BTreeMap<String, HotKeyMap>,
}

impl KeyMapSet {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The map for `name`: built-in defaults with configured entries on top.
    pub fn scope(&self, name: &str) -> HotKeyMap {
        parse::overlay(name, self.scopes.get(name))
    }

    /// Names of scopes the loaded file configured.
    pub fn configured(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }
}
