use super::KeyMapSet;
use super::defaults::{builtin_map, is_builtin_scope};
use directories::ProjectDirs;
use keyscope_core::{HotKeyEntry, HotKeyMap};
use keyscope_term::{KeySequence, Trigger, parse_trigger};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

const MAX_KEYMAP_FILE_BYTES: u64 = 1_048_576; // 1 MiB
const MAX_ACTIONS_PER_SCOPE: usize = 512;
const MAX_TOTAL_ACTIONS: usize = 1_024;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyMapsFile {
    meta: Option<KeyMapsMeta>,
    scopes: Option<BTreeMap<String, HotKeyMap>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyMapsMeta {
    description: Option<String>,
}

/// Load per-scope key maps from `keymap_file`, or from `keymaps.toml` in the
/// user config dir when no file is given.
///
/// Never fails: problems become warnings and the affected scope keeps its
/// built-in map.
pub fn load_key_maps(keymap_file: Option<&PathBuf>) -> (KeyMapSet, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut set = KeyMapSet::default();
    let config_path = keymap_file.cloned().or_else(user_keymaps_path);

    let Some(path) = config_path.as_ref() else {
        return (set, warnings);
    };
    if !path.exists() {
        if keymap_file.is_some() {
            warnings.push(format!("Keymap file not found: {}", path.display()));
        }
        return (set, warnings);
    }
    let Some(file) = read_file(path, &mut warnings) else {
        return (set, warnings);
    };

    set.description = file.meta.and_then(|meta| meta.description);
    let scopes = file.scopes.unwrap_or_default();
    let total: usize = scopes.values().map(BTreeMap::len).sum();
    if total > MAX_TOTAL_ACTIONS {
        warnings.push(format!(
            "Too many total actions in {}: {} (max {}); using built-in key maps",
            path.display(),
            total,
            MAX_TOTAL_ACTIONS
        ));
        return (set, warnings);
    }

    for (scope, map) in scopes {
        match validate_scope(&scope, &map) {
            Ok(()) => {
                if !is_builtin_scope(&scope) {
                    tracing::debug!(%scope, "loaded key map for custom scope");
                }
                set.scopes.insert(scope, map);
            }
            Err(errors) => {
                warnings.extend(errors);
                warnings.push(format!("Using built-in key map for scope '{}'", scope));
            }
        }
    }
    (set, warnings)
}

fn read_file(path: &Path, warnings: &mut Vec<String>) -> Option<KeyMapsFile> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_KEYMAP_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_KEYMAP_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<KeyMapsFile>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    }
}

fn user_keymaps_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "keyscope")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("keymaps.toml");
    Some(path)
}

fn validate_scope(scope: &str, map: &HotKeyMap) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();
    if map.len() > MAX_ACTIONS_PER_SCOPE {
        errors.push(format!(
            "Too many actions in scope '{}': {} (max {})",
            scope,
            map.len(),
            MAX_ACTIONS_PER_SCOPE
        ));
        return Err(errors);
    }

    let mut seen: HashSet<(KeySequence, Trigger)> = HashSet::new();
    for (action, entry) in map {
        let hotkeys = match entry {
            HotKeyEntry::One(hotkey) => std::slice::from_ref(hotkey),
            HotKeyEntry::Many(hotkeys) => hotkeys.as_slice(),
        };
        if hotkeys.is_empty() {
            errors.push(format!("Action '{}' in scope '{}' has no keys", action, scope));
        }
        for hotkey in hotkeys {
            let sequence = match KeySequence::parse(hotkey.sequence()) {
                Ok(sequence) => sequence,
                Err(err) => {
                    errors.push(format!("Invalid key for '{}' in scope '{}': {}", action, scope, err));
                    continue;
                }
            };
            let trigger = match parse_trigger(hotkey.sequence(), hotkey.action()) {
                Ok(trigger) => trigger,
                Err(err) => {
                    errors.push(format!("Invalid key for '{}' in scope '{}': {}", action, scope, err));
                    continue;
                }
            };
            if !seen.insert((sequence.clone(), trigger)) {
                errors.push(format!("Duplicate key '{}' in scope '{}'", sequence, scope));
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Built-in map for `scope` with the configured entries laid over it.
pub(super) fn overlay(scope: &str, configured: Option<&HotKeyMap>) -> HotKeyMap {
    let mut map = builtin_map(scope);
    if let Some(configured) = configured {
        for (action, entry) in configured {
            map.insert(action.clone(), entry.clone());
        }
    }
    map
}
