//! Declarative key map descriptors shared by every scope.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// One key sequence, optionally tagged with the trigger it reacts to.
///
/// Deserializes from either a bare string (`"C-s"`) or a table
/// (`{ sequence = "C-s", action = "release" }`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum HotKey {
    Sequence(String),
    Tagged { sequence: String, action: String },
}

impl HotKey {
    pub fn new(sequence: impl Into<String>) -> Self {
        HotKey::Sequence(sequence.into())
    }

    pub fn tagged(sequence: impl Into<String>, action: impl Into<String>) -> Self {
        HotKey::Tagged {
            sequence: sequence.into(),
            action: action.into(),
        }
    }

    pub fn sequence(&self) -> &str {
        match self {
            HotKey::Sequence(sequence) => sequence,
            HotKey::Tagged { sequence, .. } => sequence,
        }
    }

    /// The trigger discriminator handed to the matcher, if any.
    pub fn action(&self) -> Option<&str> {
        match self {
            HotKey::Sequence(_) => None,
            HotKey::Tagged { action, .. } => Some(action),
        }
    }
}

impl From<&str> for HotKey {
    fn from(sequence: &str) -> Self {
        HotKey::Sequence(sequence.to_string())
    }
}

impl From<String> for HotKey {
    fn from(sequence: String) -> Self {
        HotKey::Sequence(sequence)
    }
}

impl fmt::Display for HotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotKey::Sequence(sequence) => write!(f, "{}", sequence),
            HotKey::Tagged { sequence, action } => write!(f, "{} ({})", sequence, action),
        }
    }
}

/// The value stored under an action name: one descriptor or several.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HotKeyEntry {
    One(HotKey),
    Many(Vec<HotKey>),
}

impl From<HotKey> for HotKeyEntry {
    fn from(key: HotKey) -> Self {
        HotKeyEntry::One(key)
    }
}

impl From<&str> for HotKeyEntry {
    fn from(sequence: &str) -> Self {
        HotKeyEntry::One(HotKey::from(sequence))
    }
}

impl From<Vec<HotKey>> for HotKeyEntry {
    fn from(keys: Vec<HotKey>) -> Self {
        HotKeyEntry::Many(keys)
    }
}

impl<const N: usize> From<[&str; N]> for HotKeyEntry {
    fn from(sequences: [&str; N]) -> Self {
        HotKeyEntry::Many(sequences.iter().map(|s| HotKey::from(*s)).collect())
    }
}

/// Action name -> sequence descriptor(s).
///
/// Ordered so that rebinding visits actions deterministically.
pub type HotKeyMap = BTreeMap<String, HotKeyEntry>;

/// Build a [`HotKeyMap`] from `(action, entry)` pairs.
pub fn hotkey_map<I, K, V>(entries: I) -> HotKeyMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<HotKeyEntry>,
{
    entries
        .into_iter()
        .map(|(name, entry)| (name.into(), entry.into()))
        .collect()
}

/// Callback invoked with the raw event (if any) and the matched sequence.
pub type SequenceHandler<E> = Rc<dyn Fn(Option<&E>, &str)>;

/// Action name -> handler.
///
/// Two handler sets are considered equal when they name the same actions
/// and every action points at the same callback allocation.
pub struct Handlers<E> {
    map: BTreeMap<String, SequenceHandler<E>>,
}

impl<E> Handlers<E> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Builder-style insert of a closure.
    pub fn on(mut self, name: impl Into<String>, handler: impl Fn(Option<&E>, &str) + 'static) -> Self {
        self.map.insert(name.into(), Rc::new(handler));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: SequenceHandler<E>) {
        self.map.insert(name.into(), handler);
    }

    pub fn remove(&mut self, name: &str) -> Option<SequenceHandler<E>> {
        self.map.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&SequenceHandler<E>> {
        self.map.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SequenceHandler<E>)> {
        self.map.iter().map(|(name, handler)| (name.as_str(), handler))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Structural comparison: same names, same callback identities.
    pub fn same_as(&self, other: &Handlers<E>) -> bool {
        self.map.len() == other.map.len()
            && self
                .map
                .iter()
                .zip(other.map.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && Rc::ptr_eq(a, b))
    }
}

impl<E> Clone for Handlers<E> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<E> Default for Handlers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Handlers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotkey_deserializes_from_string_or_table() {
        #[derive(Deserialize)]
        struct Wrapper {
            keys: HotKeyMap,
        }

        let content = r#"
[keys]
save = "C-s"
help = ["?", "F1"]
jump = { sequence = "g g", action = "release" }
"#;
        let parsed: Wrapper = toml::from_str(content).expect("parse");
        assert_eq!(parsed.keys["save"], HotKeyEntry::from("C-s"));
        assert_eq!(
            parsed.keys["help"],
            HotKeyEntry::Many(vec![HotKey::from("?"), HotKey::from("F1")])
        );
        assert_eq!(
            parsed.keys["jump"],
            HotKeyEntry::One(HotKey::tagged("g g", "release"))
        );
    }

    #[test]
    fn hotkey_accessors() {
        let plain = HotKey::new("a");
        assert_eq!(plain.sequence(), "a");
        assert_eq!(plain.action(), None);

        let tagged = HotKey::tagged("b", "release");
        assert_eq!(tagged.sequence(), "b");
        assert_eq!(tagged.action(), Some("release"));
        assert_eq!(tagged.to_string(), "b (release)");
    }

    #[test]
    fn handlers_same_as_tracks_callback_identity() {
        let shared: SequenceHandler<()> = Rc::new(|_: Option<&()>, _: &str| {});
        let mut a = Handlers::new();
        a.insert("x", shared.clone());
        let mut b = Handlers::new();
        b.insert("x", shared);
        assert!(a.same_as(&b));
        assert!(a.same_as(&a.clone()));

        let c = Handlers::<()>::new().on("x", |_, _| {});
        assert!(!a.same_as(&c));

        let d = a.clone().on("y", |_, _| {});
        assert!(!a.same_as(&d));
    }
}
